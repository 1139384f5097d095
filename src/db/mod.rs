// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (Firestore).

pub mod connections;

pub use connections::ConnectionStore;

/// Collection names as constants.
pub mod collections {
    /// Wearable connections keyed by (TrueCoach client id, Terra user id)
    pub const CONNECTIONS: &str = "connections";
}
