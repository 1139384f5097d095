// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! TrueCoach API client.
//!
//! Handles:
//! - OAuth token introspection (Basic auth with our client credentials)
//! - Trainer access checks against a client record

use crate::error::AppError;
use crate::models::IntrospectionResponse;
use crate::services::secrets::TrueCoachClientCredentials;

/// TrueCoach API client.
#[derive(Clone)]
pub struct TrueCoachClient {
    http: reqwest::Client,
    base_url: String,
    introspection_url: String,
}

impl TrueCoachClient {
    pub fn new(base_url: String, introspection_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            introspection_url,
        }
    }

    /// Introspect an access token.
    ///
    /// POST {introspection_url}
    /// Authorization: Basic base64(client_id:secret)
    /// Body: token=<access_token>
    pub async fn introspect(
        &self,
        access_token: &str,
        credentials: &TrueCoachClientCredentials,
    ) -> Result<IntrospectionResponse, AppError> {
        let response = self
            .http
            .post(&self.introspection_url)
            .basic_auth(&credentials.client_id, Some(&credentials.secret))
            .form(&[("token", access_token)])
            .send()
            .await
            .map_err(|e| AppError::TrueCoachApi(format!("Introspection request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!(status = %status, "TrueCoach introspection returned an error status");
            return Err(AppError::TrueCoachApi(format!(
                "Introspection failed with status {}",
                status
            )));
        }

        response.json().await.map_err(|e| {
            AppError::TrueCoachApi(format!("Failed to parse introspection response: {}", e))
        })
    }

    /// Check whether the bearer of `access_token`, acting as a trainer, can
    /// read client `client_id`.
    ///
    /// GET {base_url}/api/clients/{client_id}
    /// role: Trainer
    ///
    /// Returns Ok(true) on any success status, Ok(false) on any other
    /// status, Err on transport failure.
    pub async fn trainer_can_access_client(
        &self,
        access_token: &str,
        client_id: &str,
    ) -> Result<bool, AppError> {
        let url = format!(
            "{}/api/clients/{}",
            self.base_url,
            urlencoding::encode(client_id)
        );

        let response = self
            .http
            .get(&url)
            .header("role", "Trainer")
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::TrueCoachApi(format!("Client lookup failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            tracing::info!(
                client_id,
                status = %status,
                "Trainer client lookup denied"
            );
        }

        Ok(status.is_success())
    }
}
