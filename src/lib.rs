// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Wearables Connect: links TrueCoach clients to Terra wearables
//!
//! This crate provides the backend API that issues Terra widget sessions,
//! relays signed Terra webhooks through an event bus into a connection
//! table, and serves connection queries to clients and their trainers.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::ConnectionStore;
use services::{
    terra_rules, AuthorizationPolicy, ConnectionEventHandler, EventBus, EventRouter,
    GoogleOidcVerifier, SecretStore, TerraClient, TokenIntrospector, TrueCoachClient,
};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: ConnectionStore,
    pub secrets: SecretStore,
    pub event_bus: EventBus,
    pub introspector: TokenIntrospector,
    pub policy: AuthorizationPolicy,
    pub terra: TerraClient,
    pub event_router: EventRouter,
    pub oidc_verifier: Arc<GoogleOidcVerifier>,
}

impl AppState {
    /// Wire the HTTP clients, policy and event rules around the given
    /// collaborators.
    pub fn new(
        config: Config,
        store: ConnectionStore,
        secrets: SecretStore,
        event_bus: EventBus,
        oidc_verifier: Arc<GoogleOidcVerifier>,
    ) -> Self {
        let truecoach = TrueCoachClient::new(
            config.truecoach_api_url.clone(),
            config.truecoach_introspection_url.clone(),
        );
        let introspector = TokenIntrospector::new(
            truecoach.clone(),
            secrets.clone(),
            config.truecoach_client_credentials_secret.clone(),
        );
        let terra = TerraClient::new(
            config.terra_api_url.clone(),
            secrets.clone(),
            config.terra_credentials_secret.clone(),
        );
        let event_router = EventRouter::new(
            terra_rules(config.target),
            ConnectionEventHandler::new(store.clone()),
        );

        Self {
            policy: AuthorizationPolicy::new(truecoach),
            introspector,
            terra,
            event_router,
            config,
            store,
            secrets,
            event_bus,
            oidc_verifier,
        }
    }
}
