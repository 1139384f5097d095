// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bearer token authentication middleware.
//!
//! Introspects the request's bearer token with TrueCoach and attaches the
//! resulting [`AuthorizationContext`] to the request extensions.

use crate::error::AppError;
use crate::models::AuthorizationContext;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Middleware that requires an active TrueCoach bearer token.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers()).ok_or(AppError::Unauthorized)?;

    let context: AuthorizationContext = state.introspector.authenticate(token).await?;
    request.extensions_mut().insert(context);

    Ok(next.run(request).await)
}

/// The token of an `Authorization: Bearer <token>` header, if non-empty.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
