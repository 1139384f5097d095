// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event bus delivery endpoint (called by Cloud Tasks).
//!
//! Returns 2xx to acknowledge an entry. Any error makes Cloud Tasks retry
//! the delivery, so only failures worth retrying are reported as errors.

use crate::error::AppError;
use crate::services::event_bus::{
    BusEntry, BUS_NAME_HEADER, DELIVERY_PATH, DETAIL_TYPE_HEADER, SOURCE_HEADER,
};
use crate::services::event_router::Delivery;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Router,
};
use std::sync::Arc;

/// Task routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route(DELIVERY_PATH, post(deliver_event))
}

fn header_string(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Deliver one bus entry to the subscription rules.
async fn deliver_event(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let entry = BusEntry {
        detail: String::from_utf8_lossy(&body).into_owned(),
        detail_type: header_string(&headers, DETAIL_TYPE_HEADER),
        source: header_string(&headers, SOURCE_HEADER),
        event_bus_name: header_string(&headers, BUS_NAME_HEADER),
    };

    match state.event_router.deliver(&entry).await {
        Ok(Delivery::Handled { rule, outcome }) => {
            tracing::info!(rule, outcome = ?outcome, "Event delivered");
            Ok(StatusCode::OK)
        }
        Ok(Delivery::Unmatched | Delivery::Discarded { .. }) => Ok(StatusCode::NO_CONTENT),
        Err(e) => {
            tracing::error!(
                error = %e,
                detail_type = %entry.detail_type,
                "Event delivery failed, will be retried"
            );
            Err(e)
        }
    }
}
