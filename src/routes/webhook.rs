// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Terra webhook receiver.
//!
//! Verifies the `terra-signature` header against the raw body and
//! publishes verified payloads, untouched, onto the event bus. The payload
//! subtype is never inspected here.

use crate::config::TERRA_WEBHOOK_DETAIL_TYPE;
use crate::error::AppError;
use crate::services::event_bus::BusEntry;
use crate::services::secrets::TerraSigningSecret;
use crate::services::signature::{verify_terra_signature, SIGNATURE_HEADER};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Router,
};
use std::sync::Arc;

/// Webhook routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/webhooks/terra", post(handle_event))
}

/// Receive a Terra webhook (POST).
async fn handle_event(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|h| !h.is_empty())
        .ok_or_else(|| AppError::BadRequest("terra-signature header missing.".to_string()))?;

    if body.is_empty() {
        return Err(AppError::BadRequest("Request body empty.".to_string()));
    }

    let raw_body = std::str::from_utf8(&body)
        .map_err(|_| AppError::BadRequest("Request body is not valid UTF-8.".to_string()))?;

    let signing: TerraSigningSecret = state
        .secrets
        .get_json(&state.config.terra_signing_secret_secret)?;

    if !verify_terra_signature(signature, raw_body, &signing.signing_secret) {
        tracing::warn!(body_len = body.len(), "Terra webhook signature mismatch");
        return Err(AppError::Unauthorized);
    }

    let target = state.config.target;
    state
        .event_bus
        .publish(BusEntry {
            detail: raw_body.to_string(),
            detail_type: TERRA_WEBHOOK_DETAIL_TYPE.to_string(),
            source: target.event_source(),
            event_bus_name: target.event_bus_name(),
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
