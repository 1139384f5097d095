// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event delivery authentication middleware.

use crate::config::EVENT_QUEUE_NAME;
use crate::middleware::auth::bearer_token;
use crate::services::google_oidc::OidcError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Header Cloud Tasks sets to the name of the delivering queue.
pub const QUEUE_NAME_HEADER: &str = "x-cloudtasks-queuename";

/// Require the event queue header and a valid OIDC token for `/tasks/*`.
pub async fn require_tasks_auth(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let queue_name_header = request.headers().get(QUEUE_NAME_HEADER);
    let is_event_queue = queue_name_header
        .and_then(|h| h.to_str().ok())
        .is_some_and(|name| name == EVENT_QUEUE_NAME);

    if !is_event_queue {
        tracing::warn!(
            header = ?queue_name_header,
            "Blocked event delivery with invalid queue header"
        );
        return Err(StatusCode::FORBIDDEN);
    }

    let Some(token) = bearer_token(request.headers()) else {
        tracing::warn!("Blocked event delivery without bearer token");
        return Err(StatusCode::FORBIDDEN);
    };

    let principal = state
        .oidc_verifier
        .verify_delivery_token(token)
        .await
        .map_err(|err| match err {
            OidcError::Forbidden(reason) => {
                tracing::warn!(reason = %reason, "Blocked event delivery: invalid OIDC token");
                StatusCode::FORBIDDEN
            }
            OidcError::Transient(reason) => {
                tracing::error!(reason = %reason, "Delivery OIDC verification transient failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        })?;

    tracing::debug!(
        email = %principal.email,
        subject = %principal.subject,
        "Event delivery OIDC verification succeeded"
    );

    Ok(next.run(request).await)
}
