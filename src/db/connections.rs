// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Connection store: the (owner, provider user) -> connection mapping.
//!
//! Backed by Firestore in deployments. An in-memory backend serves local
//! runs and tests, and an offline backend fails every call so that error
//! propagation can be exercised.

use crate::db::collections;
use crate::error::AppError;
use crate::models::ConnectionRecord;
use dashmap::DashMap;
use std::sync::Arc;

type MemoryTable = Arc<DashMap<(String, String), ConnectionRecord>>;

#[derive(Clone)]
enum Backend {
    Firestore(firestore::FirestoreDb),
    Memory(MemoryTable),
    Offline,
}

/// Connection table client.
#[derive(Clone)]
pub struct ConnectionStore {
    backend: Backend,
}

impl ConnectionStore {
    /// Connect to Firestore.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// In-process table (local runs and tests).
    pub fn new_in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(DashMap::new())),
        }
    }

    /// A store whose every operation fails.
    pub fn new_offline() -> Self {
        Self {
            backend: Backend::Offline,
        }
    }

    fn offline_error() -> AppError {
        AppError::Database("Database not connected (offline mode)".to_string())
    }

    /// Create or overwrite the record for its (owner, provider user) key.
    pub async fn put_connection(&self, record: &ConnectionRecord) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(client) => {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::CONNECTIONS)
                    .document_id(record.document_id())
                    .object(record)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
            }
            Backend::Memory(table) => {
                table.insert(
                    (record.owner_id.clone(), record.provider_user_id.clone()),
                    record.clone(),
                );
            }
            Backend::Offline => return Err(Self::offline_error()),
        }
        Ok(())
    }

    /// Delete the record for a key. Deleting a missing record succeeds.
    pub async fn delete_connection(
        &self,
        owner_id: &str,
        provider_user_id: &str,
    ) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(client) => {
                client
                    .fluent()
                    .delete()
                    .from(collections::CONNECTIONS)
                    .document_id(ConnectionRecord::document_id_for(owner_id, provider_user_id))
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
            }
            Backend::Memory(table) => {
                table.remove(&(owner_id.to_string(), provider_user_id.to_string()));
            }
            Backend::Offline => return Err(Self::offline_error()),
        }
        Ok(())
    }

    /// Get the record for a key.
    pub async fn get_connection(
        &self,
        owner_id: &str,
        provider_user_id: &str,
    ) -> Result<Option<ConnectionRecord>, AppError> {
        match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .by_id_in(collections::CONNECTIONS)
                .obj()
                .one(&ConnectionRecord::document_id_for(owner_id, provider_user_id))
                .await
                .map_err(|e| AppError::Database(e.to_string())),
            Backend::Memory(table) => Ok(table
                .get(&(owner_id.to_string(), provider_user_id.to_string()))
                .map(|entry| entry.value().clone())),
            Backend::Offline => Err(Self::offline_error()),
        }
    }

    /// All connections owned by `owner_id`, oldest first.
    pub async fn list_connections(
        &self,
        owner_id: &str,
    ) -> Result<Vec<ConnectionRecord>, AppError> {
        match &self.backend {
            Backend::Firestore(client) => {
                let owner_id = owner_id.to_string();
                client
                    .fluent()
                    .select()
                    .from(collections::CONNECTIONS)
                    .filter(move |q| q.field(OWNER_FIELD).eq(owner_id.clone()))
                    .order_by([(CREATED_AT_FIELD, firestore::FirestoreQueryDirection::Ascending)])
                    .obj()
                    .query()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))
            }
            Backend::Memory(table) => {
                let mut records: Vec<ConnectionRecord> = table
                    .iter()
                    .filter(|entry| entry.key().0 == owner_id)
                    .map(|entry| entry.value().clone())
                    .collect();
                records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
                Ok(records)
            }
            Backend::Offline => Err(Self::offline_error()),
        }
    }

    /// The first connection `owner_id` has with `provider`, if any.
    pub async fn find_connection_by_provider(
        &self,
        owner_id: &str,
        provider: &str,
    ) -> Result<Option<ConnectionRecord>, AppError> {
        Ok(self
            .list_connections(owner_id)
            .await?
            .into_iter()
            .find(|record| record.provider == provider))
    }
}

const OWNER_FIELD: &str = "TrueCoachClientId";
const CREATED_AT_FIELD: &str = "CreatedAt";

#[cfg(test)]
mod tests {
    use super::*;

    fn record(owner: &str, user: &str, provider: &str, created_at: &str) -> ConnectionRecord {
        ConnectionRecord {
            owner_id: owner.to_string(),
            provider_user_id: user.to_string(),
            provider: provider.to_string(),
            created_at: created_at.to_string(),
        }
    }

    #[tokio::test]
    async fn put_overwrites_same_key() {
        let store = ConnectionStore::new_in_memory();
        store
            .put_connection(&record("c1", "u1", "GARMIN", "2026-01-01T00:00:00Z"))
            .await
            .unwrap();
        store
            .put_connection(&record("c1", "u1", "GARMIN", "2026-02-01T00:00:00Z"))
            .await
            .unwrap();

        let all = store.list_connections("c1").await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].created_at, "2026-02-01T00:00:00Z");
    }

    #[tokio::test]
    async fn delete_missing_is_noop() {
        let store = ConnectionStore::new_in_memory();
        store.delete_connection("c1", "u1").await.unwrap();
        store.delete_connection("c1", "u1").await.unwrap();
        assert!(store.get_connection("c1", "u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_is_scoped_to_owner_and_sorted() {
        let store = ConnectionStore::new_in_memory();
        store
            .put_connection(&record("c1", "u2", "OURA", "2026-03-01T00:00:00Z"))
            .await
            .unwrap();
        store
            .put_connection(&record("c1", "u1", "GARMIN", "2026-01-01T00:00:00Z"))
            .await
            .unwrap();
        store
            .put_connection(&record("c2", "u3", "FITBIT", "2026-01-01T00:00:00Z"))
            .await
            .unwrap();

        let all = store.list_connections("c1").await.unwrap();
        let users: Vec<_> = all.iter().map(|r| r.provider_user_id.as_str()).collect();
        assert_eq!(users, vec!["u1", "u2"]);

        let oura = store
            .find_connection_by_provider("c1", "OURA")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(oura.provider_user_id, "u2");
        assert!(store
            .find_connection_by_provider("c1", "WHOOP")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn offline_store_errors() {
        let store = ConnectionStore::new_offline();
        assert!(matches!(
            store.list_connections("c1").await,
            Err(AppError::Database(_))
        ));
        assert!(matches!(
            store.delete_connection("c1", "u1").await,
            Err(AppError::Database(_))
        ));
    }
}
