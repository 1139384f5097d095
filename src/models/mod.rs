// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod auth;
pub mod connection;
pub mod webhook;

pub use auth::{AuthorizationContext, IntrospectionResponse};
pub use connection::ConnectionRecord;
pub use webhook::{EventStatus, EventType, TerraUser, WebhookEvent};
