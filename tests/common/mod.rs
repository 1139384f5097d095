// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use wearables_connect::config::Config;
use wearables_connect::db::ConnectionStore;
use wearables_connect::routes::create_router;
use wearables_connect::services::signature::{compute_signature, format_signature_header};
use wearables_connect::services::{EventBus, GoogleOidcVerifier, SecretStore};
use wearables_connect::AppState;

pub const SIGNING_SECRET: &str = "whsec_test_secret";

const OIDC_KID: &str = "test-kid";
const OIDC_PRIVATE_KEY: &str = include_str!("../fixtures/tasks_oidc_key.pem");
const OIDC_PUBLIC_KEY: &str = include_str!("../fixtures/tasks_oidc_key.pub.pem");

/// Secret bundles matching `Config::test_default()`.
#[allow(dead_code)]
pub fn test_secrets() -> SecretStore {
    SecretStore::new_static([
        (
            "TERRA_CREDENTIALS_SECRET",
            r#"{"devId":"test-dev","apiKey":"test-key"}"#.to_string(),
        ),
        (
            "TERRA_SIGNING_SECRET_SECRET",
            format!(r#"{{"signingSecret":"{}"}}"#, SIGNING_SECRET),
        ),
        (
            "TRUECOACH_CLIENT_CREDENTIALS_SECRET",
            r#"{"clientId":"tc-client","secret":"tc-secret"}"#.to_string(),
        ),
    ])
}

/// Test app with in-memory store and bus.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with(
        Config::test_default(),
        ConnectionStore::new_in_memory(),
        EventBus::new_in_memory(),
    )
}

/// Test app around the given config and collaborators.
#[allow(dead_code)]
pub fn create_test_app_with(
    config: Config,
    store: ConnectionStore,
    event_bus: EventBus,
) -> (axum::Router, Arc<AppState>) {
    let decoding_key = DecodingKey::from_rsa_pem(OIDC_PUBLIC_KEY.as_bytes())
        .expect("test public key should parse");
    let oidc_verifier = Arc::new(
        GoogleOidcVerifier::new_with_static_key(&config, OIDC_KID, decoding_key)
            .expect("static verifier should build"),
    );

    let state = Arc::new(AppState::new(
        config,
        store,
        test_secrets(),
        event_bus,
        oidc_verifier,
    ));

    (create_router(state.clone()), state)
}

/// A `terra-signature` header for `body` at timestamp `t`.
#[allow(dead_code)]
pub fn sign(body: &str, t: &str) -> String {
    let digest = compute_signature(t, body, SIGNING_SECRET).expect("HMAC accepts any key");
    format_signature_header(t, &digest)
}

/// An OIDC token the test app's verifier accepts for event deliveries.
#[allow(dead_code)]
pub fn create_test_tasks_oidc_jwt(config: &Config) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();

    let claims = serde_json::json!({
        "iss": "https://accounts.google.com",
        "aud": config.api_url,
        "sub": "109876543210",
        "exp": now + 300,
        "iat": now,
        "email": config.tasks_service_account_email(),
        "email_verified": true,
    });

    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(OIDC_KID.to_string());

    encode(
        &header,
        &claims,
        &EncodingKey::from_rsa_pem(OIDC_PRIVATE_KEY.as_bytes()).unwrap(),
    )
    .unwrap()
}

/// Wiremock responder body for an active introspection.
#[allow(dead_code)]
pub fn introspection_body(
    client_id: Option<&str>,
    trainer_id: Option<&str>,
    scope: &str,
) -> serde_json::Value {
    serde_json::json!({
        "active": true,
        "iat": 1760000000,
        "username": "someone@example.com",
        "scope": scope,
        "sub": "42",
        "user_client_id": client_id,
        "user_trainer_id": trainer_id,
    })
}
