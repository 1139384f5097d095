// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.
//!
//! Every [`AppError`] maps onto one [`ErrorKind`], and the kind alone
//! decides the HTTP status, the machine-readable code and the default
//! message sent to the caller.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Client-facing error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Internal,
}

impl ErrorKind {
    /// Status, code and default message for this kind.
    pub const fn descriptor(self) -> (StatusCode, &'static str, &'static str) {
        match self {
            ErrorKind::BadRequest => (
                StatusCode::BAD_REQUEST,
                "bad_request",
                "Request not understood due to invalid syntax.",
            ),
            ErrorKind::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Missing or invalid authentication.",
            ),
            ErrorKind::Forbidden => (
                StatusCode::FORBIDDEN,
                "forbidden",
                "Insufficient permission to access requested resource.",
            ),
            ErrorKind::NotFound => (
                StatusCode::NOT_FOUND,
                "not_found",
                "Requested resource does not exist.",
            ),
            ErrorKind::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "error",
                "An unexpected error has occurred.",
            ),
        }
    }

    pub const fn status(self) -> StatusCode {
        self.descriptor().0
    }

    pub const fn code(self) -> &'static str {
        self.descriptor().1
    }

    pub const fn default_message(self) -> &'static str {
        self.descriptor().2
    }
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Access forbidden")]
    Forbidden,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Terra API error: {0}")]
    TerraApi(String),

    #[error("TrueCoach API error: {0}")]
    TrueCoachApi(String),

    #[error("Secret store error: {0}")]
    Secrets(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Event bus error: {0}")]
    EventBus(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::BadRequest(_) => ErrorKind::BadRequest,
            AppError::Unauthorized => ErrorKind::Unauthorized,
            AppError::Forbidden => ErrorKind::Forbidden,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::TerraApi(_)
            | AppError::TrueCoachApi(_)
            | AppError::Secrets(_)
            | AppError::Database(_)
            | AppError::EventBus(_)
            | AppError::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// JSON error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();

        // Only request-shape problems echo their detail back to the caller.
        let message = match &self {
            AppError::BadRequest(msg) | AppError::NotFound(msg) => msg.clone(),
            AppError::Unauthorized | AppError::Forbidden => {
                tracing::debug!(error = %self, "Request rejected");
                kind.default_message().to_string()
            }
            _ => {
                tracing::error!(error = %self, "Request failed");
                kind.default_message().to_string()
            }
        };

        let body = ErrorResponse {
            code: kind.code(),
            message,
        };

        (kind.status(), Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
