// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Internal event bus backed by Cloud Tasks.
//!
//! Publishing creates one HTTP task per entry. Cloud Tasks delivers it to
//! `/tasks/events` with the untouched detail as the request body and the
//! envelope fields as headers, and retries the delivery until the
//! handler acknowledges it.
//!
//! Uses the official google-cloud-tasks-v2 SDK.

use crate::error::{AppError, Result};
use std::sync::{Arc, Mutex};

/// Delivery path the task queue posts entries to.
pub const DELIVERY_PATH: &str = "/tasks/events";

pub const DETAIL_TYPE_HEADER: &str = "x-event-detail-type";
pub const SOURCE_HEADER: &str = "x-event-source";
pub const BUS_NAME_HEADER: &str = "x-event-bus-name";

/// One event on the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusEntry {
    /// Raw payload, exactly as received
    pub detail: String,
    pub detail_type: String,
    pub source: String,
    pub event_bus_name: String,
}

#[derive(Clone)]
enum Backend {
    CloudTasks {
        project_id: String,
        location: String,
        queue_name: String,
        service_url: String,
        service_account_email: String,
    },
    Memory(Arc<Mutex<Vec<BusEntry>>>),
    Offline,
}

/// Publishes entries onto the bus.
#[derive(Clone)]
pub struct EventBus {
    backend: Backend,
}

impl EventBus {
    /// Bus delivering through the Cloud Tasks queue `queue_name` to
    /// `service_url`, with OIDC tokens minted for `service_account_email`.
    pub fn new(
        project_id: &str,
        region: &str,
        queue_name: &str,
        service_url: &str,
        service_account_email: &str,
    ) -> Self {
        Self {
            backend: Backend::CloudTasks {
                project_id: project_id.to_string(),
                location: region.to_string(),
                queue_name: queue_name.to_string(),
                service_url: service_url.trim_end_matches('/').to_string(),
                service_account_email: service_account_email.to_string(),
            },
        }
    }

    /// Bus that records entries in memory (tests).
    pub fn new_in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(Mutex::new(Vec::new()))),
        }
    }

    /// Bus whose every publish fails.
    pub fn new_offline() -> Self {
        Self {
            backend: Backend::Offline,
        }
    }

    /// Entries published so far (in-memory bus only), removing them.
    pub fn drain(&self) -> Vec<BusEntry> {
        match &self.backend {
            Backend::Memory(entries) => entries
                .lock()
                .map(|mut guard| std::mem::take(&mut *guard))
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    /// Publish one entry. Failures are returned, never retried here.
    pub async fn publish(&self, entry: BusEntry) -> Result<()> {
        match &self.backend {
            Backend::CloudTasks {
                project_id,
                location,
                queue_name,
                service_url,
                service_account_email,
            } => {
                let queue_path = format!(
                    "projects/{}/locations/{}/queues/{}",
                    project_id, location, queue_name
                );
                create_http_task(&queue_path, service_url, service_account_email, &entry).await?;
            }
            Backend::Memory(entries) => {
                entries
                    .lock()
                    .map_err(|_| AppError::EventBus("in-memory bus poisoned".to_string()))?
                    .push(entry.clone());
            }
            Backend::Offline => {
                return Err(AppError::EventBus(
                    "Event bus not connected (offline mode)".to_string(),
                ));
            }
        }

        tracing::info!(
            detail_type = %entry.detail_type,
            source = %entry.source,
            event_bus = %entry.event_bus_name,
            "Published event"
        );
        Ok(())
    }
}

async fn create_http_task(
    queue_path: &str,
    service_url: &str,
    service_account_email: &str,
    entry: &BusEntry,
) -> Result<()> {
    use google_cloud_tasks_v2::client::CloudTasks;
    use google_cloud_tasks_v2::model::{HttpRequest, OidcToken, Task};

    let client = CloudTasks::builder()
        .build()
        .await
        .map_err(|e| AppError::EventBus(format!("Cloud Tasks client error: {}", e)))?;

    let http_request = HttpRequest::default()
        .set_url(format!("{}{}", service_url, DELIVERY_PATH))
        .set_http_method("POST")
        .set_body(axum::body::Bytes::from(entry.detail.clone().into_bytes()))
        .set_headers(std::collections::HashMap::from([
            ("Content-Type".to_string(), "application/json".to_string()),
            (DETAIL_TYPE_HEADER.to_string(), entry.detail_type.clone()),
            (SOURCE_HEADER.to_string(), entry.source.clone()),
            (BUS_NAME_HEADER.to_string(), entry.event_bus_name.clone()),
        ]))
        .set_oidc_token(
            OidcToken::default()
                .set_service_account_email(service_account_email.to_string())
                .set_audience(service_url.to_string()),
        );

    let task = Task::default().set_http_request(http_request);

    let _response = client
        .create_task()
        .set_parent(queue_path.to_string())
        .set_task(task)
        .send()
        .await
        .map_err(|e| AppError::EventBus(format!("Cloud Tasks create error: {}", e)))?;

    Ok(())
}
