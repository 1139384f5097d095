// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Terra API client.
//!
//! Handles:
//! - Widget session creation for device linking
//! - Graphs tokens for the client-side chart widget
//! - Deauthenticating a linked user
//!
//! Developer credentials are read from the secret store on every call.

use crate::error::AppError;
use crate::services::secrets::{SecretStore, TerraCredentials};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Seconds shaved off Terra's widget session lifetime so clients never
/// hand out a session that is about to expire.
const WIDGET_SESSION_EXPIRY_MARGIN_SECS: i64 = 120;

/// Lifetime of a graphs token.
const GRAPHS_TOKEN_TTL_SECS: i64 = 840;

/// Redirect targets for a widget session.
#[derive(Debug, Clone, Default)]
pub struct WidgetSessionRequest {
    pub reference_id: String,
    pub success_redirect_url: Option<String>,
    pub failure_redirect_url: Option<String>,
}

/// A widget session ready to hand to the client.
#[derive(Debug, Clone)]
pub struct WidgetSession {
    pub session_id: Option<String>,
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// A graphs token and its expiry.
#[derive(Debug, Clone)]
pub struct GraphsToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct GenerateWidgetSessionBody<'a> {
    reference_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    auth_success_redirect_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    auth_failure_redirect_url: Option<&'a str>,
    language: &'a str,
    show_disconnect: bool,
    use_terra_avengers_app: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateWidgetSessionResponse {
    status: String,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct GraphsTokenResponse {
    token: String,
}

/// Terra API client.
#[derive(Clone)]
pub struct TerraClient {
    http: reqwest::Client,
    base_url: String,
    secrets: SecretStore,
    credentials_secret: String,
}

impl TerraClient {
    pub fn new(base_url: String, secrets: SecretStore, credentials_secret: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            secrets,
            credentials_secret,
        }
    }

    fn credentials(&self) -> Result<TerraCredentials, AppError> {
        self.secrets.get_json(&self.credentials_secret)
    }

    /// Create a widget session for linking a wearable to `reference_id`.
    ///
    /// POST {base_url}/auth/generateWidgetSession
    pub async fn generate_widget_session(
        &self,
        request: &WidgetSessionRequest,
    ) -> Result<WidgetSession, AppError> {
        let credentials = self.credentials()?;
        let url = format!("{}/auth/generateWidgetSession", self.base_url);

        let body = GenerateWidgetSessionBody {
            reference_id: &request.reference_id,
            auth_success_redirect_url: request.success_redirect_url.as_deref(),
            auth_failure_redirect_url: request.failure_redirect_url.as_deref(),
            language: "en",
            show_disconnect: true,
            use_terra_avengers_app: false,
        };

        let response = self
            .http
            .post(&url)
            .header("dev-id", &credentials.dev_id)
            .header("x-api-key", &credentials.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::TerraApi(format!("Widget session request failed: {}", e)))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            AppError::TerraApi(format!("Failed to read widget session response: {}", e))
        })?;

        if !status.is_success() {
            tracing::error!(status = %status, body = %text, "Terra widget session failed");
            return Err(AppError::TerraApi(format!(
                "Widget session failed with status {}",
                status
            )));
        }

        let parsed: GenerateWidgetSessionResponse = serde_json::from_str(&text).map_err(|e| {
            AppError::TerraApi(format!("Failed to parse widget session response: {}", e))
        })?;

        if parsed.status != "success" {
            tracing::error!(body = %text, "Terra widget session reported failure");
            return Err(AppError::TerraApi(format!(
                "Widget session status {}",
                parsed.status
            )));
        }

        let url = parsed
            .url
            .ok_or_else(|| AppError::TerraApi("Widget session response missing url".to_string()))?;
        let expires_in = parsed.expires_in.ok_or_else(|| {
            AppError::TerraApi("Widget session response missing expires_in".to_string())
        })?;

        Ok(WidgetSession {
            session_id: parsed.session_id,
            url,
            expires_at: widget_session_expiry(Utc::now(), expires_in),
        })
    }

    /// Fetch a graphs token for a Terra user.
    ///
    /// GET {base_url}/graphs/token?user_id=...
    pub async fn graphs_token(&self, provider_user_id: &str) -> Result<GraphsToken, AppError> {
        let credentials = self.credentials()?;
        let url = format!("{}/graphs/token", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[("user_id", provider_user_id)])
            .header("Cache-Control", "no-cache")
            .header("dev-id", &credentials.dev_id)
            .header("x-api-key", &credentials.api_key)
            .send()
            .await
            .map_err(|e| AppError::TerraApi(format!("Graphs token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Terra graphs token failed");
            return Err(AppError::TerraApi(format!(
                "Graphs token failed with status {}",
                status
            )));
        }

        let parsed: GraphsTokenResponse = response.json().await.map_err(|e| {
            AppError::TerraApi(format!("Failed to parse graphs token response: {}", e))
        })?;

        Ok(GraphsToken {
            token: parsed.token,
            expires_at: Utc::now() + Duration::seconds(GRAPHS_TOKEN_TTL_SECS),
        })
    }

    /// Deauthenticate a Terra user, revoking the provider link.
    ///
    /// DELETE {base_url}/auth/deauthenticateUser?user_id=...
    pub async fn deauthenticate_user(&self, provider_user_id: &str) -> Result<(), AppError> {
        let credentials = self.credentials()?;
        let url = format!("{}/auth/deauthenticateUser", self.base_url);

        let response = self
            .http
            .delete(&url)
            .query(&[("user_id", provider_user_id)])
            .header("dev-id", &credentials.dev_id)
            .header("x-api-key", &credentials.api_key)
            .send()
            .await
            .map_err(|e| AppError::TerraApi(format!("Deauthentication request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Terra deauthentication failed");
            return Err(AppError::TerraApi(format!(
                "Deauthentication failed with status {}",
                status
            )));
        }

        tracing::info!(provider_user_id, "Deauthenticated user from Terra");
        Ok(())
    }
}

fn widget_session_expiry(now: DateTime<Utc>, expires_in_secs: i64) -> DateTime<Utc> {
    now + Duration::seconds(expires_in_secs - WIDGET_SESSION_EXPIRY_MARGIN_SECS)
}
