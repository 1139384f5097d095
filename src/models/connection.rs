// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Connection model: one linked wearable-provider account.

use serde::{Deserialize, Serialize};

/// A TrueCoach client's link to a Terra user, keyed by
/// (owner id, provider user id).
///
/// Field names follow the persisted table schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    /// TrueCoach client id owning the connection
    #[serde(rename = "TrueCoachClientId")]
    pub owner_id: String,
    /// Terra's opaque user id for the linked account
    #[serde(rename = "TerraUserId")]
    pub provider_user_id: String,
    /// Wearable provider name as reported by Terra (e.g. GARMIN)
    #[serde(rename = "Provider")]
    pub provider: String,
    /// When the connection was (re-)authorized, RFC 3339
    #[serde(rename = "CreatedAt")]
    pub created_at: String,
}

impl ConnectionRecord {
    /// Store document id for a key. Components are url-encoded, which
    /// always escapes `:`, so the separator cannot appear inside either one.
    pub fn document_id_for(owner_id: &str, provider_user_id: &str) -> String {
        format!(
            "{}:{}",
            urlencoding::encode(owner_id),
            urlencoding::encode(provider_user_id)
        )
    }

    pub fn document_id(&self) -> String {
        Self::document_id_for(&self.owner_id, &self.provider_user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_table_attribute_names() {
        let record = ConnectionRecord {
            owner_id: "c1".to_string(),
            provider_user_id: "u1".to_string(),
            provider: "GARMIN".to_string(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["TrueCoachClientId"], "c1");
        assert_eq!(json["TerraUserId"], "u1");
        assert_eq!(json["Provider"], "GARMIN");
        assert_eq!(json["CreatedAt"], "2026-01-01T00:00:00Z");
    }

    #[test]
    fn document_ids_do_not_collide() {
        assert_ne!(
            ConnectionRecord::document_id_for("a_b", "c"),
            ConnectionRecord::document_id_for("a", "b_c")
        );
        assert_ne!(
            ConnectionRecord::document_id_for("a:b", "c"),
            ConnectionRecord::document_id_for("a", "b:c")
        );
        assert_eq!(ConnectionRecord::document_id_for("c1", "u1"), "c1:u1");
    }
}
