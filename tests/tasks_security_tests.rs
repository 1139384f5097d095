// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Security and routing tests for the event delivery endpoint.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use tower::ServiceExt;
use wearables_connect::config::Config;
use wearables_connect::db::ConnectionStore;
use wearables_connect::services::EventBus;

mod common;

const AUTH_EVENT: &str = r#"{"type":"auth","status":"success","user":{"user_id":"u1","provider":"OURA","reference_id":"c1"}}"#;
const DEAUTH_EVENT: &str = r#"{"type":"deauth","status":"success","user":{"user_id":"u1","provider":"OURA","reference_id":"c1"}}"#;

fn delivery(queue: Option<&str>, token: Option<&str>, source: &str, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/tasks/events")
        .header("content-type", "application/json")
        .header("x-event-detail-type", "TerraWebhook")
        .header("x-event-source", source)
        .header("x-event-bus-name", "WearablesEventBus-staging");
    if let Some(queue) = queue {
        builder = builder.header("x-cloudtasks-queuename", queue);
    }
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_delivery_without_queue_header_forbidden() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_tasks_oidc_jwt(&state.config);

    let response = app
        .oneshot(delivery(None, Some(&token), "WearablesApi-staging", AUTH_EVENT))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(state.store.list_connections("c1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delivery_wrong_queue_name_forbidden() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_tasks_oidc_jwt(&state.config);

    let response = app
        .oneshot(delivery(
            Some("activity-processing"),
            Some(&token),
            "WearablesApi-staging",
            AUTH_EVENT,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_delivery_missing_auth_forbidden() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(delivery(
            Some("terra-events"),
            None,
            "WearablesApi-staging",
            AUTH_EVENT,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_delivery_token_for_other_service_forbidden() {
    let (app, _) = common::create_test_app();
    let other = Config {
        api_url: "https://other-service.example".to_string(),
        ..Config::test_default()
    };
    let token = common::create_test_tasks_oidc_jwt(&other);

    let response = app
        .oneshot(delivery(
            Some("terra-events"),
            Some(&token),
            "WearablesApi-staging",
            AUTH_EVENT,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_auth_then_deauth_delivery() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_tasks_oidc_jwt(&state.config);

    let response = app
        .clone()
        .oneshot(delivery(
            Some("terra-events"),
            Some(&token),
            "WearablesApi-staging",
            AUTH_EVENT,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let stored = state.store.get_connection("c1", "u1").await.unwrap();
    assert_eq!(stored.map(|r| r.provider), Some("OURA".to_string()));

    // Delivered twice: the second deauth finds nothing and still succeeds.
    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(delivery(
                Some("terra-events"),
                Some(&token),
                "WearablesApi-staging",
                DEAUTH_EVENT,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert!(state.store.get_connection("c1", "u1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_other_environment_is_acknowledged_not_handled() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_tasks_oidc_jwt(&state.config);

    let response = app
        .oneshot(delivery(
            Some("terra-events"),
            Some(&token),
            "WearablesApi-production",
            AUTH_EVENT,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(state.store.list_connections("c1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_store_failure_requests_redelivery() {
    let (app, state) = common::create_test_app_with(
        Config::test_default(),
        ConnectionStore::new_offline(),
        EventBus::new_in_memory(),
    );
    let token = common::create_test_tasks_oidc_jwt(&state.config);

    let response = app
        .oneshot(delivery(
            Some("terra-events"),
            Some(&token),
            "WearablesApi-staging",
            AUTH_EVENT,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
