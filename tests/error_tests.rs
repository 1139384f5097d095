// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::response::IntoResponse;
use wearables_connect::error::{AppError, ErrorKind};

async fn rendered(err: AppError) -> (u16, String) {
    let response = err.into_response();
    let status = response.status().as_u16();
    let body = axum::body::to_bytes(response.into_body(), 1024)
        .await
        .unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[test]
fn test_upstream_errors_are_internal() {
    assert_eq!(
        AppError::TrueCoachApi("status 503".to_string()).kind(),
        ErrorKind::Internal
    );
    assert_eq!(
        AppError::Secrets("secret X is not available".to_string()).kind(),
        ErrorKind::Internal
    );
    assert_eq!(
        AppError::Internal(anyhow::anyhow!("boom")).kind(),
        ErrorKind::Internal
    );
}

#[tokio::test]
async fn test_internal_detail_never_reaches_the_caller() {
    let (status, body) = rendered(AppError::Secrets(
        "secret TERRA_SIGNING_SECRET_SECRET is malformed (line 1, column 7)".to_string(),
    ))
    .await;

    assert_eq!(status, 500);
    assert!(!body.contains("TERRA_SIGNING_SECRET_SECRET"));
    assert!(body.contains("An unexpected error has occurred."));
}

#[tokio::test]
async fn test_not_found_keeps_its_message() {
    let (status, body) = rendered(AppError::NotFound("No GARMIN connection.".to_string())).await;

    assert_eq!(status, 404);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["code"], "not_found");
    assert_eq!(json["message"], "No GARMIN connection.");
}
