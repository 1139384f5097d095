// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Secret store adapter.
//!
//! Credential bundles are JSON documents addressed by logical name. In
//! Cloud Run the secret bindings inject each bundle as an environment
//! variable named after the secret, so the production backend reads the
//! process environment on every lookup. Tests use a static map.

use crate::error::AppError;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Terra developer credentials.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerraCredentials {
    pub dev_id: String,
    pub api_key: String,
}

/// Shared secret Terra signs webhooks with.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerraSigningSecret {
    pub signing_secret: String,
}

/// OAuth client credentials used for token introspection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrueCoachClientCredentials {
    pub client_id: String,
    pub secret: String,
}

#[derive(Clone)]
enum Backend {
    Env,
    Static(Arc<HashMap<String, String>>),
}

/// Fetches named credential bundles.
#[derive(Clone)]
pub struct SecretStore {
    backend: Backend,
}

impl SecretStore {
    /// Read bundles from environment variables injected by secret bindings.
    pub fn from_env() -> Self {
        Self {
            backend: Backend::Env,
        }
    }

    /// Serve bundles from a fixed map (tests and local runs).
    pub fn new_static<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            backend: Backend::Static(Arc::new(map)),
        }
    }

    /// Raw secret string for `name`.
    pub fn get_raw(&self, name: &str) -> Result<String, AppError> {
        match &self.backend {
            Backend::Env => std::env::var(name)
                .map_err(|_| AppError::Secrets(format!("secret {} is not available", name))),
            Backend::Static(map) => map
                .get(name)
                .cloned()
                .ok_or_else(|| AppError::Secrets(format!("secret {} is not available", name))),
        }
    }

    /// Parse the bundle stored under `name`.
    pub fn get_json<T: DeserializeOwned>(&self, name: &str) -> Result<T, AppError> {
        let raw = self.get_raw(name)?;
        // The payload may hold credentials: report only where parsing failed.
        serde_json::from_str(raw.trim()).map_err(|e| {
            AppError::Secrets(format!(
                "secret {} is malformed (line {}, column {})",
                name,
                e.line(),
                e.column()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bundles_from_static_store() {
        let store = SecretStore::new_static([
            ("TERRA", r#"{"devId":"dev","apiKey":"key"}"#),
            ("SIGNING", r#"{"signingSecret":"shh"}"#),
            ("TC", r#"{"clientId":"id","secret":"s"}"#),
        ]);

        let terra: TerraCredentials = store.get_json("TERRA").unwrap();
        assert_eq!(terra.dev_id, "dev");
        assert_eq!(terra.api_key, "key");

        let signing: TerraSigningSecret = store.get_json("SIGNING").unwrap();
        assert_eq!(signing.signing_secret, "shh");

        let tc: TrueCoachClientCredentials = store.get_json("TC").unwrap();
        assert_eq!(tc.client_id, "id");
        assert_eq!(tc.secret, "s");
    }

    #[test]
    fn missing_secret_is_an_error() {
        let store = SecretStore::new_static(Vec::<(String, String)>::new());
        assert!(matches!(
            store.get_raw("NOPE"),
            Err(AppError::Secrets(_))
        ));
    }

    #[test]
    fn malformed_secret_does_not_leak_contents() {
        let store = SecretStore::new_static([("BAD", "{\"apiKey\": super-secret")]);
        let err = store.get_json::<TerraCredentials>("BAD").unwrap_err();
        assert!(!err.to_string().contains("super-secret"));
    }

    #[test]
    fn env_backend_reads_process_environment() {
        std::env::set_var(
            "WEARABLES_TEST_SIGNING_SECRET",
            r#"{"signingSecret":"from-env"}"#,
        );
        let store = SecretStore::from_env();
        let signing: TerraSigningSecret = store.get_json("WEARABLES_TEST_SIGNING_SECRET").unwrap();
        assert_eq!(signing.signing_secret, "from-env");
    }
}
