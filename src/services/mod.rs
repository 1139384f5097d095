// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic and external collaborators.

pub mod authorization;
pub mod connection_events;
pub mod event_bus;
pub mod event_router;
pub mod google_oidc;
pub mod introspection;
pub mod secrets;
pub mod signature;
pub mod terra;
pub mod truecoach;

pub use authorization::{AuthorizationPolicy, Decision};
pub use connection_events::{ConnectionEventHandler, HandlerOutcome};
pub use event_bus::{BusEntry, EventBus};
pub use event_router::{terra_rules, Delivery, EventRouter};
pub use google_oidc::{DeliveryPrincipal, GoogleOidcVerifier, OidcError};
pub use introspection::TokenIntrospector;
pub use secrets::SecretStore;
pub use terra::TerraClient;
pub use truecoach::TrueCoachClient;
