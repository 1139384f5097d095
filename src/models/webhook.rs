// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Terra webhook payloads as seen by the event handlers.

use serde::Deserialize;

/// Event subtype carried in the payload's `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Auth,
    Deauth,
    /// Terra sends many other types (activity, sleep, ...) that no rule routes.
    #[serde(other)]
    Other,
}

/// Outcome reported by Terra for the event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Success,
    Error,
    #[serde(other)]
    Other,
}

/// Terra user descriptor nested in lifecycle events.
#[derive(Debug, Clone, Deserialize)]
pub struct TerraUser {
    pub user_id: String,
    pub provider: String,
    /// Links back to the TrueCoach client id
    #[serde(default)]
    pub reference_id: Option<String>,
    #[serde(default)]
    pub last_webhook_update: Option<String>,
    #[serde(default)]
    pub scopes: Option<String>,
}

/// A verified webhook payload relayed through the event bus.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub status: EventStatus,
    pub user: TerraUser,
    #[serde(default)]
    pub reference_id: Option<String>,
    #[serde(default)]
    pub widget_session_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl WebhookEvent {
    /// Owner id for an auth event: the top-level reference id, falling
    /// back to the user descriptor's.
    pub fn auth_owner_id(&self) -> Option<&str> {
        self.reference_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .or_else(|| self.deauth_owner_id())
    }

    /// Owner id for a deauth event.
    pub fn deauth_owner_id(&self) -> Option<&str> {
        self.user.reference_id.as_deref().filter(|id| !id.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_auth_success() {
        let event: WebhookEvent = serde_json::from_str(
            r#"{"type":"auth","status":"success","reference_id":"c1",
                "widget_session_id":"ws-1",
                "user":{"user_id":"u1","provider":"GARMIN","reference_id":"c1",
                        "last_webhook_update":null,"scopes":null}}"#,
        )
        .unwrap();

        assert_eq!(event.event_type, EventType::Auth);
        assert_eq!(event.status, EventStatus::Success);
        assert_eq!(event.auth_owner_id(), Some("c1"));
        assert_eq!(event.widget_session_id.as_deref(), Some("ws-1"));
    }

    #[test]
    fn auth_owner_falls_back_to_user_reference() {
        let event: WebhookEvent = serde_json::from_str(
            r#"{"type":"auth","status":"success",
                "user":{"user_id":"u1","provider":"GARMIN","reference_id":"c9"}}"#,
        )
        .unwrap();

        assert_eq!(event.auth_owner_id(), Some("c9"));
    }

    #[test]
    fn unknown_type_and_status_are_tolerated() {
        let event: WebhookEvent = serde_json::from_str(
            r#"{"type":"activity","status":"warning",
                "user":{"user_id":"u1","provider":"OURA"}}"#,
        )
        .unwrap();

        assert_eq!(event.event_type, EventType::Other);
        assert_eq!(event.status, EventStatus::Other);
        assert_eq!(event.deauth_owner_id(), None);
    }
}
