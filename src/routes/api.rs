// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated TrueCoach users.

use crate::error::{AppError, Result};
use crate::models::{AuthorizationContext, ConnectionRecord};
use crate::services::authorization::parse_single_owner_id;
use crate::services::terra::WidgetSessionRequest;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// API routes (require a bearer token).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/connect/widget-session", post(create_widget_session))
        .route(
            "/api/v1/connections",
            get(list_connections).delete(disconnect),
        )
}

/// Response envelope.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export)
)]
pub struct DataResponse<T> {
    pub data: T,
}

// ─── Widget Session ──────────────────────────────────────────

#[derive(Debug, Default, Deserialize, Validate)]
struct WidgetSessionBody {
    #[validate(url)]
    success_redirect_url: Option<String>,
    #[validate(url)]
    failure_redirect_url: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export)
)]
pub struct WidgetSessionResponse {
    pub url: String,
    pub expires_at: String,
}

/// Create a Terra widget session for the calling client.
async fn create_widget_session(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthorizationContext>,
    body: Bytes,
) -> Result<Json<DataResponse<WidgetSessionResponse>>> {
    let body: WidgetSessionBody = if body.is_empty() {
        WidgetSessionBody::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))?
    };
    body.validate()
        .map_err(|e| AppError::BadRequest(format!("Invalid redirect URL: {}", e)))?;

    let owner_id = ctx.user_client_id.clone().ok_or(AppError::Forbidden)?;

    tracing::info!(owner_id = %owner_id, "Creating widget session");

    let session = state
        .terra
        .generate_widget_session(&WidgetSessionRequest {
            reference_id: owner_id,
            success_redirect_url: body.success_redirect_url,
            failure_redirect_url: body.failure_redirect_url,
        })
        .await?;

    Ok(Json(DataResponse {
        data: WidgetSessionResponse {
            url: session.url,
            expires_at: format_utc_rfc3339(session.expires_at),
        },
    }))
}

// ─── Connections ─────────────────────────────────────────────

#[derive(Deserialize)]
struct ConnectionsQuery {
    /// Owner id; a single id only
    client_ids: Option<String>,
    /// Comma-separated expansions (`graphs_token`)
    include: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export)
)]
pub struct GraphsTokenResponse {
    pub token: String,
    pub expires_at: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export)
)]
pub struct ConnectionResponse {
    pub client_id: String,
    pub provider: String,
    pub graphs_token: Option<GraphsTokenResponse>,
    pub created_at: String,
}

fn includes(include: Option<&str>, expansion: &str) -> bool {
    include.is_some_and(|list| list.split(',').any(|item| item.trim() == expansion))
}

/// List a client's connections, optionally with graphs tokens.
async fn list_connections(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthorizationContext>,
    Query(params): Query<ConnectionsQuery>,
) -> Result<Json<DataResponse<Vec<ConnectionResponse>>>> {
    let owner_id = parse_single_owner_id(params.client_ids.as_deref())?;
    state.policy.authorize(&ctx, &owner_id).await?.require()?;

    let records = state.store.list_connections(&owner_id).await?;
    let with_tokens = includes(params.include.as_deref(), "graphs_token");

    tracing::debug!(
        owner_id = %owner_id,
        count = records.len(),
        with_tokens,
        "Listing connections"
    );

    // One Terra round trip per record, in order.
    let mut data = Vec::with_capacity(records.len());
    for record in records {
        let graphs_token = if with_tokens {
            let token = state.terra.graphs_token(&record.provider_user_id).await?;
            Some(GraphsTokenResponse {
                token: token.token,
                expires_at: format_utc_rfc3339(token.expires_at),
            })
        } else {
            None
        };
        data.push(connection_response(record, graphs_token));
    }

    Ok(Json(DataResponse { data }))
}

fn connection_response(
    record: ConnectionRecord,
    graphs_token: Option<GraphsTokenResponse>,
) -> ConnectionResponse {
    ConnectionResponse {
        client_id: record.owner_id,
        provider: record.provider,
        graphs_token,
        created_at: record.created_at,
    }
}

#[derive(Deserialize)]
struct DisconnectQuery {
    client_id: Option<String>,
    provider: Option<String>,
}

/// Disconnect a client's device from a provider.
///
/// Terra is told first; the record is only removed once Terra accepted the
/// deauthentication.
async fn disconnect(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthorizationContext>,
    Query(params): Query<DisconnectQuery>,
) -> Result<StatusCode> {
    let owner_id = parse_single_owner_id(params.client_id.as_deref())?;
    let provider = params
        .provider
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::BadRequest("A provider is required.".to_string()))?
        .to_string();

    state.policy.authorize(&ctx, &owner_id).await?.require()?;

    let record = state
        .store
        .find_connection_by_provider(&owner_id, &provider)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("No {} connection for client {}.", provider, owner_id))
        })?;

    state
        .terra
        .deauthenticate_user(&record.provider_user_id)
        .await?;
    state
        .store
        .delete_connection(&record.owner_id, &record.provider_user_id)
        .await?;

    tracing::info!(
        owner_id = %owner_id,
        provider = %provider,
        provider_user_id = %record.provider_user_id,
        "Connection disconnected"
    );

    Ok(StatusCode::NO_CONTENT)
}
