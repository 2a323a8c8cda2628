// SPDX-FileCopyrightText: 2026 Leasesign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the agreement store and event log traits.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use leasesign_config::model::StorageConfig;
use leasesign_core::{
    AdapterType, Agreement, AgreementStatus, AgreementStore, AgreementUpdate, EventLog,
    HealthStatus, LeasesignError, PluginAdapter, Signatory, SignatureStatus, StoredEvent,
    WebhookEvent,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is opened by [`SqliteStorage::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`initialize`](Self::initialize) is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Open the database and run migrations.
    pub async fn initialize(&self) -> Result<(), LeasesignError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| LeasesignError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    pub fn database(&self) -> Result<&Database, LeasesignError> {
        self.db.get().ok_or_else(|| LeasesignError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    /// Seed an agreement row.
    pub async fn insert_agreement(&self, agreement: &Agreement) -> Result<(), LeasesignError> {
        queries::agreements::insert_agreement(self.database()?, agreement).await
    }

    /// Read an agreement by id.
    pub async fn get_agreement(&self, id: &str) -> Result<Option<Agreement>, LeasesignError> {
        queries::agreements::get_agreement(self.database()?, id).await
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, LeasesignError> {
        let db = self.database()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), LeasesignError> {
        if let Some(db) = self.db.get() {
            crate::database::checkpoint(db.connection()).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl AgreementStore for SqliteStorage {
    async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Agreement>, LeasesignError> {
        queries::agreements::find_by_reference(self.database()?, reference).await
    }

    async fn signatories(&self, agreement_id: &str) -> Result<Vec<Signatory>, LeasesignError> {
        queries::agreements::get_signatories(self.database()?, agreement_id).await
    }

    async fn update_agreement(
        &self,
        agreement_id: &str,
        update: &AgreementUpdate,
        updated_at: &str,
    ) -> Result<(), LeasesignError> {
        queries::agreements::update_agreement(self.database()?, agreement_id, update, updated_at)
            .await
    }

    async fn force_signature_status(
        &self,
        agreement_id: &str,
        signature_status: &SignatureStatus,
        status: Option<AgreementStatus>,
        updated_at: &str,
    ) -> Result<(), LeasesignError> {
        queries::agreements::force_signature_status(
            self.database()?,
            agreement_id,
            signature_status,
            status,
            updated_at,
        )
        .await
    }
}

#[async_trait]
impl EventLog for SqliteStorage {
    async fn append_event(
        &self,
        event: &WebhookEvent,
        with_processed: bool,
    ) -> Result<String, LeasesignError> {
        queries::events::append_event(self.database()?, event, with_processed).await
    }

    async fn mark_processed(&self, event_record_id: &str) -> Result<(), LeasesignError> {
        queries::events::mark_processed(self.database()?, event_record_id).await
    }

    async fn list_events(
        &self,
        request_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<StoredEvent>, LeasesignError> {
        queries::events::list_events(self.database()?, request_id, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    fn make_agreement(id: &str, reference: &str) -> Agreement {
        Agreement {
            id: id.to_string(),
            property_id: None,
            rentee_id: None,
            external_reference: Some(reference.to_string()),
            status: AgreementStatus::PendingSignature,
            signature_status: Some(SignatureStatus::Pending),
            signatories: Vec::new(),
            signed_document_url: None,
            signed_date: None,
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
            updated_at: "2026-01-01T00:00:00.000Z".to_string(),
        }
    }

    #[tokio::test]
    async fn sqlite_storage_implements_plugin_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        assert_eq!(storage.name(), "sqlite");
        assert_eq!(storage.version(), semver::Version::new(0, 1, 0));
        assert_eq!(storage.adapter_type(), AdapterType::Storage);
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("double_init.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        assert!(db_path.exists(), "database file should be created");
        assert!(storage.initialize().await.is_err(), "second initialize should fail");
    }

    #[tokio::test]
    async fn health_check_reflects_initialization() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("health.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        assert!(storage.health_check().await.is_err());
        storage.initialize().await.unwrap();
        assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn agreement_lifecycle_through_traits() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("lifecycle.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));
        storage.initialize().await.unwrap();
        storage
            .insert_agreement(&make_agreement("ag-1", "r1"))
            .await
            .unwrap();

        let store: &dyn AgreementStore = &storage;
        let found = store.find_by_reference("r1").await.unwrap().unwrap();
        assert_eq!(found.id, "ag-1");

        let update = AgreementUpdate {
            status: Some(AgreementStatus::Signed),
            signature_status: Some(SignatureStatus::Completed),
            signed_date: Some("T3".to_string()),
            ..Default::default()
        };
        store
            .update_agreement("ag-1", &update, "2026-01-02T00:00:00.000Z")
            .await
            .unwrap();
        let stored = storage.get_agreement("ag-1").await.unwrap().unwrap();
        assert_eq!(stored.status, AgreementStatus::Signed);
        assert_eq!(stored.signed_date.as_deref(), Some("T3"));

        storage.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn event_log_through_traits() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("events.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));
        storage.initialize().await.unwrap();

        let log: &dyn EventLog = &storage;
        let event = WebhookEvent::from_body(br#"{"RequestId":"r1","EventId":1}"#);
        let id = log.append_event(&event, true).await.unwrap();
        log.mark_processed(&id).await.unwrap();

        let listed = log.list_events(Some("r1"), 5).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].processed, Some(true));
    }
}
