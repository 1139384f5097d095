// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bearer token introspection.
//!
//! Every request re-introspects its token; nothing is cached.

use crate::error::AppError;
use crate::models::AuthorizationContext;
use crate::services::secrets::{SecretStore, TrueCoachClientCredentials};
use crate::services::truecoach::TrueCoachClient;

/// Turns bearer tokens into [`AuthorizationContext`]s.
#[derive(Clone)]
pub struct TokenIntrospector {
    client: TrueCoachClient,
    secrets: SecretStore,
    credentials_secret: String,
}

impl TokenIntrospector {
    pub fn new(client: TrueCoachClient, secrets: SecretStore, credentials_secret: String) -> Self {
        Self {
            client,
            secrets,
            credentials_secret,
        }
    }

    /// Introspect using the client credentials from the secret store.
    pub async fn authenticate(&self, bearer_token: &str) -> Result<AuthorizationContext, AppError> {
        let credentials: TrueCoachClientCredentials =
            self.secrets.get_json(&self.credentials_secret)?;
        self.introspect(bearer_token, &credentials).await
    }

    /// Introspect `bearer_token`; inactive tokens are `Unauthorized`.
    pub async fn introspect(
        &self,
        bearer_token: &str,
        credentials: &TrueCoachClientCredentials,
    ) -> Result<AuthorizationContext, AppError> {
        if bearer_token.is_empty() {
            return Err(AppError::Unauthorized);
        }

        let response = self.client.introspect(bearer_token, credentials).await?;

        if !response.active {
            tracing::info!("Rejected inactive bearer token");
            return Err(AppError::Unauthorized);
        }

        let context = response.into_context(bearer_token.to_string());

        tracing::debug!(
            sub = context.sub.as_deref().unwrap_or("<none>"),
            user_client_id = context.user_client_id.as_deref().unwrap_or("<none>"),
            user_trainer_id = context.user_trainer_id.as_deref().unwrap_or("<none>"),
            "Bearer token introspected"
        );

        Ok(context)
    }
}
