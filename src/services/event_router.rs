// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bus subscription rules.
//!
//! The webhook receiver publishes payloads without looking inside them.
//! Routing by subtype happens here, on delivery: each rule matches the
//! entry's detail type, its environment-scoped source and the payload's
//! `type` field, and names the handler that consumes it.

use crate::config::{DeploymentTarget, TERRA_WEBHOOK_DETAIL_TYPE};
use crate::error::Result;
use crate::models::WebhookEvent;
use crate::services::connection_events::{ConnectionEventHandler, HandlerOutcome};
use crate::services::event_bus::BusEntry;

/// Handler a rule delivers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleTarget {
    TerraAuth,
    TerraDeauth,
}

/// One subscription rule.
#[derive(Debug, Clone)]
pub struct EventRule {
    pub name: &'static str,
    pub detail_type: String,
    pub source: String,
    /// Required value of the payload's `type` field
    pub payload_type: &'static str,
    pub target: RuleTarget,
}

impl EventRule {
    fn matches(&self, entry: &BusEntry, payload_type: Option<&str>) -> bool {
        entry.detail_type == self.detail_type
            && entry.source == self.source
            && payload_type == Some(self.payload_type)
    }
}

/// The rules deployed for an environment.
pub fn terra_rules(target: DeploymentTarget) -> Vec<EventRule> {
    vec![
        EventRule {
            name: "terra-auth",
            detail_type: TERRA_WEBHOOK_DETAIL_TYPE.to_string(),
            source: target.event_source(),
            payload_type: "auth",
            target: RuleTarget::TerraAuth,
        },
        EventRule {
            name: "terra-deauth",
            detail_type: TERRA_WEBHOOK_DETAIL_TYPE.to_string(),
            source: target.event_source(),
            payload_type: "deauth",
            target: RuleTarget::TerraDeauth,
        },
    ]
}

/// Result of delivering one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Handled {
        rule: &'static str,
        outcome: HandlerOutcome,
    },
    /// No rule matched; the entry is dropped.
    Unmatched,
    /// A rule matched but the payload is not a lifecycle event.
    Discarded { rule: &'static str },
}

/// Applies the rules to delivered entries.
#[derive(Clone)]
pub struct EventRouter {
    rules: Vec<EventRule>,
    handler: ConnectionEventHandler,
}

impl EventRouter {
    pub fn new(rules: Vec<EventRule>, handler: ConnectionEventHandler) -> Self {
        Self { rules, handler }
    }

    pub fn rules(&self) -> &[EventRule] {
        &self.rules
    }

    /// Deliver an entry to the first matching rule's handler.
    ///
    /// Handler errors are returned so the bus retries the delivery.
    pub async fn deliver(&self, entry: &BusEntry) -> Result<Delivery> {
        let payload: Option<serde_json::Value> = serde_json::from_str(&entry.detail).ok();
        let payload_type = payload
            .as_ref()
            .and_then(|p| p.get("type"))
            .and_then(|t| t.as_str());

        let Some(rule) = self
            .rules
            .iter()
            .find(|rule| rule.matches(entry, payload_type))
        else {
            tracing::debug!(
                detail_type = %entry.detail_type,
                source = %entry.source,
                payload_type = payload_type.unwrap_or("<none>"),
                "No rule matched event, dropping"
            );
            return Ok(Delivery::Unmatched);
        };

        let event = match payload.map(serde_json::from_value::<WebhookEvent>).transpose() {
            Ok(Some(event)) => event,
            Ok(None) | Err(_) => {
                tracing::error!(rule = rule.name, "Matched event is not a Terra lifecycle payload");
                return Ok(Delivery::Discarded { rule: rule.name });
            }
        };

        let outcome = match rule.target {
            RuleTarget::TerraAuth => self.handler.handle_auth(&event).await?,
            RuleTarget::TerraDeauth => self.handler.handle_deauth(&event).await?,
        };

        Ok(Delivery::Handled {
            rule: rule.name,
            outcome,
        })
    }
}
