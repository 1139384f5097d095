// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Owner-scoped authorization.
//!
//! A caller may act on an owner's connections when:
//! 1. the token belongs to that client (self-access), or
//! 2. the token belongs to a trainer with the `trainer` scope and
//!    TrueCoach confirms the trainer can read that client.
//!
//! Checks are not cached; delegated checks cost one TrueCoach round trip.

use crate::error::AppError;
use crate::models::AuthorizationContext;
use crate::services::truecoach::TrueCoachClient;

const TRAINER_SCOPE: &str = "trainer";

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Forbidden,
}

impl Decision {
    /// Convert to a handler result, mapping `Forbidden` to 403.
    pub fn require(self) -> Result<(), AppError> {
        match self {
            Decision::Allowed => Ok(()),
            Decision::Forbidden => Err(AppError::Forbidden),
        }
    }
}

/// Decides whether a context may act for a requested owner.
#[derive(Clone)]
pub struct AuthorizationPolicy {
    truecoach: TrueCoachClient,
}

impl AuthorizationPolicy {
    pub fn new(truecoach: TrueCoachClient) -> Self {
        Self { truecoach }
    }

    pub async fn authorize(
        &self,
        context: &AuthorizationContext,
        requested_owner_id: &str,
    ) -> Result<Decision, AppError> {
        if context.user_client_id.as_deref() == Some(requested_owner_id) {
            return Ok(Decision::Allowed);
        }

        let Some(trainer_id) = context.user_trainer_id.as_deref() else {
            return Ok(Decision::Forbidden);
        };

        if !context.has_scope(TRAINER_SCOPE) {
            return Ok(Decision::Forbidden);
        }

        let allowed = self
            .truecoach
            .trainer_can_access_client(&context.access_token, requested_owner_id)
            .await?;

        tracing::debug!(
            trainer_id,
            owner_id = requested_owner_id,
            allowed,
            "Trainer delegation checked"
        );

        Ok(if allowed {
            Decision::Allowed
        } else {
            Decision::Forbidden
        })
    }
}

/// Parse an owner id query value, rejecting batch (comma-separated) and
/// empty values.
pub fn parse_single_owner_id(raw: Option<&str>) -> Result<String, AppError> {
    let raw = raw.map(str::trim).unwrap_or_default();

    if raw.is_empty() {
        return Err(AppError::BadRequest("A client id is required.".to_string()));
    }

    if raw.contains(',') {
        return Err(AppError::BadRequest(
            "Querying multiple client ids is not supported.".to_string(),
        ));
    }

    Ok(raw.to_string())
}
