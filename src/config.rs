// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Assembled once at startup and handed to each service constructor.
//! Credential bundles themselves are not part of the config: only the
//! names under which the secret store exposes them.

use std::env;
use std::fmt;
use std::str::FromStr;

/// Cloud Tasks queue that carries event bus deliveries.
pub const EVENT_QUEUE_NAME: &str = "terra-events";

/// Detail type stamped on every relayed Terra webhook.
pub const TERRA_WEBHOOK_DETAIL_TYPE: &str = "TerraWebhook";

const DEFAULT_TERRA_API_URL: &str = "https://api.tryterra.co/v2";
const DEFAULT_TC_API_DOMAIN: &str = "api-staging.truecoach.co";
const INTROSPECTION_PATH: &str = "/api/oauth/token/introspect";

/// Deployment environment. Scopes event bus names and sources so that
/// staging and production never consume each other's events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentTarget {
    Staging,
    Production,
}

impl DeploymentTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentTarget::Staging => "staging",
            DeploymentTarget::Production => "production",
        }
    }

    /// Source tag attached to published events.
    pub fn event_source(&self) -> String {
        format!("WearablesApi-{}", self.as_str())
    }

    /// Name of the environment's event bus.
    pub fn event_bus_name(&self) -> String {
        format!("WearablesEventBus-{}", self.as_str())
    }
}

impl fmt::Display for DeploymentTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeploymentTarget {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "staging" => Ok(DeploymentTarget::Staging),
            "production" => Ok(DeploymentTarget::Production),
            other => Err(ConfigError::Invalid("TARGET", other.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Deployment environment (staging/production)
    pub target: DeploymentTarget,
    /// Public base URL of this service (Cloud Tasks target + OIDC audience)
    pub api_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// GCP region hosting the task queue
    pub gcp_region: String,

    /// Terra API base URL
    pub terra_api_url: String,
    /// TrueCoach API base URL (scheme + domain)
    pub truecoach_api_url: String,
    /// TrueCoach OAuth token introspection endpoint
    pub truecoach_introspection_url: String,

    // --- Secret bundle names (resolved through the secret store) ---
    /// `{ devId, apiKey }` for Terra API calls
    pub terra_credentials_secret: String,
    /// `{ signingSecret }` for webhook signature verification
    pub terra_signing_secret_secret: String,
    /// `{ clientId, secret }` for token introspection
    pub truecoach_client_credentials_secret: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let target: DeploymentTarget = env::var("TARGET")
            .map_err(|_| ConfigError::Missing("TARGET"))?
            .parse()?;

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT", raw.clone()))?,
            Err(_) => 8080,
        };

        let truecoach_api_url = normalize_api_domain(
            &env::var("TC_API_DOMAIN").unwrap_or_else(|_| DEFAULT_TC_API_DOMAIN.to_string()),
        );
        let truecoach_introspection_url = env::var("TC_INTROSPECTION_URL")
            .unwrap_or_else(|_| format!("{}{}", truecoach_api_url, INTROSPECTION_PATH));

        Ok(Self {
            port,
            target,
            api_url: env::var("API_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}", port))
                .trim_end_matches('/')
                .to_string(),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            gcp_region: env::var("GCP_REGION").unwrap_or_else(|_| "us-east1".to_string()),
            terra_api_url: env::var("TERRA_API_URL")
                .unwrap_or_else(|_| DEFAULT_TERRA_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            truecoach_api_url,
            truecoach_introspection_url,
            terra_credentials_secret: secret_name("TERRA_CREDENTIALS_SECRET"),
            terra_signing_secret_secret: secret_name("TERRA_SIGNING_SECRET_SECRET"),
            truecoach_client_credentials_secret: secret_name(
                "TRUECOACH_CLIENT_CREDENTIALS_SECRET",
            ),
        })
    }

    /// Config for tests: staging target, local URLs.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            target: DeploymentTarget::Staging,
            api_url: "http://localhost:8080".to_string(),
            gcp_project_id: "test-project".to_string(),
            gcp_region: "us-east1".to_string(),
            terra_api_url: "http://localhost:9001".to_string(),
            truecoach_api_url: "http://localhost:9002".to_string(),
            truecoach_introspection_url: format!("http://localhost:9002{}", INTROSPECTION_PATH),
            terra_credentials_secret: "TERRA_CREDENTIALS_SECRET".to_string(),
            terra_signing_secret_secret: "TERRA_SIGNING_SECRET_SECRET".to_string(),
            truecoach_client_credentials_secret: "TRUECOACH_CLIENT_CREDENTIALS_SECRET"
                .to_string(),
        }
    }

    /// Point TrueCoach calls (introspection + client lookups) at `base_url`.
    pub fn with_truecoach_api_url(mut self, base_url: &str) -> Self {
        self.truecoach_api_url = normalize_api_domain(base_url);
        self.truecoach_introspection_url =
            format!("{}{}", self.truecoach_api_url, INTROSPECTION_PATH);
        self
    }

    /// Point Terra calls at `base_url`.
    pub fn with_terra_api_url(mut self, base_url: &str) -> Self {
        self.terra_api_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Service account Cloud Tasks signs delivery tokens with.
    pub fn tasks_service_account_email(&self) -> String {
        format!(
            "wearables-connect-api@{}.iam.gserviceaccount.com",
            self.gcp_project_id
        )
    }
}

/// The secret store name for a bundle, overridable per deployment.
fn secret_name(var: &str) -> String {
    env::var(var).unwrap_or_else(|_| var.to_string())
}

/// `TC_API_DOMAIN` is a bare domain in deployments; tests pass full URLs.
fn normalize_api_domain(raw: &str) -> String {
    let raw = raw.trim().trim_end_matches('/');
    if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
