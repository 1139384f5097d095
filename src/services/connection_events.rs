// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Connection lifecycle event handlers.
//!
//! Both handlers are idempotent: the auth handler overwrites the record
//! for its key and the deauth handler treats a missing record as already
//! deleted. Store failures are returned so the bus redelivers.

use crate::db::ConnectionStore;
use crate::error::Result;
use crate::models::{ConnectionRecord, EventStatus, WebhookEvent};
use crate::time_utils::format_utc_rfc3339;

/// What a handler did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    Stored,
    Deleted,
    /// Logged only (error status or unusable payload)
    Ignored,
}

#[derive(Clone)]
pub struct ConnectionEventHandler {
    store: ConnectionStore,
}

impl ConnectionEventHandler {
    pub fn new(store: ConnectionStore) -> Self {
        Self { store }
    }

    /// Handle a Terra `auth` event.
    pub async fn handle_auth(&self, event: &WebhookEvent) -> Result<HandlerOutcome> {
        if event.status != EventStatus::Success {
            tracing::warn!(
                provider = %event.user.provider,
                provider_user_id = %event.user.user_id,
                message = event.message.as_deref().unwrap_or(""),
                reason = event.reason.as_deref().unwrap_or(""),
                "Terra auth event failure"
            );
            return Ok(HandlerOutcome::Ignored);
        }

        let Some(owner_id) = event.auth_owner_id() else {
            tracing::error!(
                provider_user_id = %event.user.user_id,
                "Terra auth success without reference id, cannot link connection"
            );
            return Ok(HandlerOutcome::Ignored);
        };

        let record = ConnectionRecord {
            owner_id: owner_id.to_string(),
            provider_user_id: event.user.user_id.clone(),
            provider: event.user.provider.clone(),
            created_at: format_utc_rfc3339(chrono::Utc::now()),
        };

        if let Err(e) = self.store.put_connection(&record).await {
            tracing::error!(
                error = %e,
                owner_id,
                provider_user_id = %record.provider_user_id,
                "Failed to store connection from auth event"
            );
            return Err(e);
        }

        tracing::info!(
            owner_id,
            provider_user_id = %record.provider_user_id,
            provider = %record.provider,
            widget_session_id = event.widget_session_id.as_deref().unwrap_or(""),
            "Connection stored"
        );

        Ok(HandlerOutcome::Stored)
    }

    /// Handle a Terra `deauth` event.
    pub async fn handle_deauth(&self, event: &WebhookEvent) -> Result<HandlerOutcome> {
        let Some(owner_id) = event.deauth_owner_id() else {
            tracing::warn!(
                provider_user_id = %event.user.user_id,
                "Terra deauth without reference id, nothing to delete"
            );
            return Ok(HandlerOutcome::Ignored);
        };

        if let Err(e) = self
            .store
            .delete_connection(owner_id, &event.user.user_id)
            .await
        {
            tracing::error!(
                error = %e,
                owner_id,
                provider_user_id = %event.user.user_id,
                "Failed to delete connection from deauth event"
            );
            return Err(e);
        }

        tracing::info!(
            owner_id,
            provider_user_id = %event.user.user_id,
            provider = %event.user.provider,
            "Connection deleted"
        );

        Ok(HandlerOutcome::Deleted)
    }
}
