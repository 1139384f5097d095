// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OIDC verification for event deliveries.
//!
//! Cloud Tasks attaches a Google-signed ID token to every delivery to
//! `/tasks/events`. A token is accepted when it is signed by one of Google's
//! published keys, is addressed to `API_URL` and names this service's
//! account with a verified email.

use crate::config::Config;
use anyhow::Context;
use chrono::Utc;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Google's published ID token signing keys.
pub const GOOGLE_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";

const GOOGLE_ISSUERS: [&str; 2] = ["https://accounts.google.com", "accounts.google.com"];
const KEY_SET_MAX_AGE: Duration = Duration::from_secs(3600);
/// An unknown kid only triggers a refetch once the set is this old.
const KEY_SET_MIN_AGE: Duration = Duration::from_secs(60);
const FETCH_TIMEOUT: Duration = Duration::from_secs(5);
const LEEWAY_SECS: u64 = 60;

/// Who sent a verified delivery.
#[derive(Debug, Clone)]
pub struct DeliveryPrincipal {
    pub email: String,
    pub subject: String,
    pub audience: String,
}

#[derive(Debug, Clone)]
pub enum OidcError {
    /// The token is not acceptable; answered with 403
    Forbidden(String),
    /// Google's keys could not be fetched; the queue retries
    Transient(String),
}

/// Claims a delivery token must carry beyond what `Validation` checks.
#[derive(Debug, Deserialize)]
struct DeliveryClaims {
    sub: String,
    aud: String,
    iat: i64,
    email: String,
    email_verified: bool,
}

struct FetchedKeys {
    by_kid: HashMap<String, Arc<DecodingKey>>,
    fetched_at: Instant,
}

enum SigningKeys {
    Google {
        http: reqwest::Client,
        jwks_url: String,
        cached: RwLock<Option<FetchedKeys>>,
    },
    Static {
        kid: String,
        key: Arc<DecodingKey>,
    },
}

/// Verifier for the delivery queue's ID tokens.
pub struct GoogleOidcVerifier {
    keys: SigningKeys,
    validation: Validation,
    service_account_email: String,
}

impl GoogleOidcVerifier {
    /// Verifier backed by Google's published keys.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Self::with_jwks_url(config, GOOGLE_JWKS_URL)
    }

    fn with_jwks_url(config: &Config, jwks_url: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .context("failed building JWKS HTTP client")?;

        let verifier = Self::build(
            config,
            SigningKeys::Google {
                http,
                jwks_url: jwks_url.to_string(),
                cached: RwLock::new(None),
            },
        );

        tracing::info!(
            audience = %config.api_url,
            email = %verifier.service_account_email,
            "Delivery token verifier ready"
        );
        Ok(verifier)
    }

    /// Verifier trusting one RSA key under `kid`, for local runs and tests.
    pub fn new_with_static_key(
        config: &Config,
        kid: impl Into<String>,
        key: DecodingKey,
    ) -> anyhow::Result<Self> {
        let kid = kid.into();
        anyhow::ensure!(!kid.trim().is_empty(), "static key id must not be empty");

        Ok(Self::build(
            config,
            SigningKeys::Static {
                kid,
                key: Arc::new(key),
            },
        ))
    }

    fn build(config: &Config, keys: SigningKeys) -> Self {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&GOOGLE_ISSUERS);
        validation.set_audience(&[config.api_url.trim_end_matches('/')]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.leeway = LEEWAY_SECS;

        Self {
            keys,
            validation,
            service_account_email: config.tasks_service_account_email(),
        }
    }

    /// Verify a delivery's bearer token.
    pub async fn verify_delivery_token(&self, token: &str) -> Result<DeliveryPrincipal, OidcError> {
        let kid = decode_header(token)
            .map_err(|e| OidcError::Forbidden(format!("malformed token header: {e}")))?
            .kid
            .ok_or_else(|| OidcError::Forbidden("token header has no kid".to_string()))?;

        let key = self.key_for(&kid).await?;
        let claims = decode::<DeliveryClaims>(token, &key, &self.validation)
            .map_err(|e| OidcError::Forbidden(format!("token rejected: {e}")))?
            .claims;

        if claims.iat > Utc::now().timestamp() + LEEWAY_SECS as i64 {
            return Err(OidcError::Forbidden("token issued in the future".to_string()));
        }
        if !claims.email_verified {
            return Err(OidcError::Forbidden("token email is not verified".to_string()));
        }
        if claims.email != self.service_account_email {
            return Err(OidcError::Forbidden(format!(
                "token issued to {}",
                claims.email
            )));
        }

        Ok(DeliveryPrincipal {
            email: claims.email,
            subject: claims.sub,
            audience: claims.aud,
        })
    }

    async fn key_for(&self, kid: &str) -> Result<Arc<DecodingKey>, OidcError> {
        let (http, jwks_url, cached) = match &self.keys {
            SigningKeys::Static { kid: known, key } if known == kid => return Ok(key.clone()),
            SigningKeys::Static { .. } => {
                return Err(OidcError::Forbidden(format!("unknown key id {kid}")))
            }
            SigningKeys::Google {
                http,
                jwks_url,
                cached,
            } => (http, jwks_url, cached),
        };

        {
            let cached = cached.read().await;
            if let Some(keys) = cached.as_ref() {
                let age = keys.fetched_at.elapsed();
                if age < KEY_SET_MAX_AGE {
                    if let Some(key) = keys.by_kid.get(kid) {
                        return Ok(key.clone());
                    }
                    if age < KEY_SET_MIN_AGE {
                        return Err(OidcError::Forbidden(format!("unknown key id {kid}")));
                    }
                }
            }
        }

        let fetched = fetch_keys(http, jwks_url).await?;
        let key = fetched.by_kid.get(kid).cloned();
        *cached.write().await = Some(fetched);

        key.ok_or_else(|| OidcError::Forbidden(format!("unknown key id {kid}")))
    }
}

async fn fetch_keys(http: &reqwest::Client, jwks_url: &str) -> Result<FetchedKeys, OidcError> {
    let response = http
        .get(jwks_url)
        .send()
        .await
        .map_err(|e| OidcError::Transient(format!("JWKS request failed: {e}")))?;

    if !response.status().is_success() {
        return Err(OidcError::Transient(format!(
            "JWKS request returned {}",
            response.status()
        )));
    }

    let set: JwkSet = response
        .json()
        .await
        .map_err(|e| OidcError::Transient(format!("malformed JWKS: {e}")))?;

    let by_kid: HashMap<_, _> = set
        .keys
        .iter()
        .filter_map(|jwk| {
            let kid = jwk.common.key_id.clone()?;
            match DecodingKey::from_jwk(jwk) {
                Ok(key) => Some((kid, Arc::new(key))),
                Err(e) => {
                    tracing::warn!(kid = %kid, error = %e, "Skipping unusable JWKS key");
                    None
                }
            }
        })
        .collect();

    if by_kid.is_empty() {
        return Err(OidcError::Transient("JWKS has no usable keys".to_string()));
    }

    tracing::debug!(keys = by_kid.len(), "Fetched Google signing keys");
    Ok(FetchedKeys {
        by_kid,
        fetched_at: Instant::now(),
    })
}
