// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Wearables Connect API Server
//!
//! Links TrueCoach clients to their wearables through Terra and relays
//! Terra connection events into the connection table.

use wearables_connect::{
    config::{Config, EVENT_QUEUE_NAME},
    db::ConnectionStore,
    services::{EventBus, GoogleOidcVerifier, SecretStore},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        target = %config.target,
        "Starting Wearables Connect API"
    );

    let store = ConnectionStore::new(&config.gcp_project_id).await?;

    let event_bus = EventBus::new(
        &config.gcp_project_id,
        &config.gcp_region,
        EVENT_QUEUE_NAME,
        &config.api_url,
        &config.tasks_service_account_email(),
    );
    tracing::info!(
        project = %config.gcp_project_id,
        queue = EVENT_QUEUE_NAME,
        bus = %config.target.event_bus_name(),
        "Event bus initialized"
    );

    let oidc_verifier = Arc::new(GoogleOidcVerifier::new(&config)?);

    let state = Arc::new(AppState::new(
        config.clone(),
        store,
        SecretStore::from_env(),
        event_bus,
        oidc_verifier,
    ));

    let app = wearables_connect::routes::create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wearables_connect=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
