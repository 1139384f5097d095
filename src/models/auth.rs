// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-request authorization context derived from token introspection.

use serde::{Deserialize, Deserializer};

/// Claims of an introspected TrueCoach bearer token.
///
/// Lives for one request only; never persisted or cached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationContext {
    /// The raw bearer token, forwarded on delegated checks
    pub access_token: String,
    pub iat: Option<String>,
    pub username: Option<String>,
    /// Space-delimited scope list
    pub scope: Option<String>,
    pub sub: Option<String>,
    /// TrueCoach client id when the token belongs to a client
    pub user_client_id: Option<String>,
    /// TrueCoach trainer id when the token belongs to a trainer
    pub user_trainer_id: Option<String>,
}

impl AuthorizationContext {
    /// Whether the scope list contains `scope` as a whole token.
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scope
            .as_deref()
            .is_some_and(|s| s.split(' ').any(|token| token == scope))
    }
}

/// Introspection response body (RFC 7662 plus TrueCoach extensions).
#[derive(Debug, Clone, Deserialize)]
pub struct IntrospectionResponse {
    #[serde(default)]
    pub active: bool,
    #[serde(default, deserialize_with = "optional_id")]
    pub iat: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default, deserialize_with = "optional_id")]
    pub sub: Option<String>,
    #[serde(default, deserialize_with = "optional_id")]
    pub user_client_id: Option<String>,
    #[serde(default, deserialize_with = "optional_id")]
    pub user_trainer_id: Option<String>,
}

impl IntrospectionResponse {
    /// Project the response into a context for `access_token`.
    pub fn into_context(self, access_token: String) -> AuthorizationContext {
        AuthorizationContext {
            access_token,
            iat: self.iat,
            username: self.username,
            scope: self.scope,
            sub: self.sub,
            user_client_id: self.user_client_id,
            user_trainer_id: self.user_trainer_id,
        }
    }
}

/// Ids arrive as JSON numbers from TrueCoach but are compared as strings.
fn optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(serde_json::Number),
        Text(String),
    }

    Ok(
        Option::<RawId>::deserialize(deserializer)?.map(|raw| match raw {
            RawId::Number(n) => n.to_string(),
            RawId::Text(s) => s,
        }),
    )
}
