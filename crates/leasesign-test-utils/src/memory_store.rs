// SPDX-FileCopyrightText: 2026 Leasesign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory agreement store and event log.
//!
//! Both mirror the SQLite adapter's error contract: a missing row is
//! `NotFound`, `signature_status = unknown` is a `ConstraintViolation`, and a
//! deployment without the `processed` column reports `UnsupportedField`.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use leasesign_core::{
    AdapterType, Agreement, AgreementStatus, AgreementStore, AgreementUpdate, EventLog,
    HealthStatus, LeasesignError, PluginAdapter, Signatory, SignatureStatus, StoredEvent,
    WebhookEvent,
};

/// Failure injected into [`MemoryAgreementStore::update_agreement`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteFailure {
    /// Reject as if the named column did not exist.
    UnsupportedField(String),
    /// Reject as if a CHECK or JSON constraint failed.
    ConstraintViolation(String),
    /// Fail with a plain storage error.
    Storage(String),
}

impl WriteFailure {
    fn to_error(&self) -> LeasesignError {
        match self {
            WriteFailure::UnsupportedField(field) => LeasesignError::UnsupportedField {
                table: "agreements".to_string(),
                field: field.clone(),
            },
            WriteFailure::ConstraintViolation(detail) => LeasesignError::ConstraintViolation {
                table: "agreements".to_string(),
                detail: detail.clone(),
            },
            WriteFailure::Storage(message) => LeasesignError::Storage {
                source: message.clone().into(),
            },
        }
    }
}

/// A mock agreement table.
#[derive(Default)]
pub struct MemoryAgreementStore {
    agreements: Arc<Mutex<HashMap<String, Agreement>>>,
    update_failure: Mutex<Option<WriteFailure>>,
    fail_lookups: AtomicBool,
    fail_forced: AtomicBool,
    updates: Mutex<Vec<(String, AgreementUpdate)>>,
    forced: Mutex<Vec<(String, SignatureStatus, Option<AgreementStatus>)>>,
    signatory_reads: AtomicUsize,
}

impl MemoryAgreementStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an agreement.
    pub async fn insert(&self, agreement: Agreement) {
        self.agreements
            .lock()
            .await
            .insert(agreement.id.clone(), agreement);
    }

    /// Current state of an agreement.
    pub async fn get(&self, id: &str) -> Option<Agreement> {
        self.agreements.lock().await.get(id).cloned()
    }

    /// Make every `update_agreement` call fail with `failure` (or stop failing).
    pub async fn fail_updates_with(&self, failure: Option<WriteFailure>) {
        *self.update_failure.lock().await = failure;
    }

    /// Make lookups by reference fail with a storage error.
    pub fn fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    /// Make the narrow status write fail with a storage error.
    pub fn fail_forced_writes(&self, fail: bool) {
        self.fail_forced.store(fail, Ordering::SeqCst);
    }

    /// Updates that reached the store successfully.
    pub async fn applied_updates(&self) -> Vec<(String, AgreementUpdate)> {
        self.updates.lock().await.clone()
    }

    /// Narrow status writes that reached the store successfully.
    pub async fn forced_writes(&self) -> Vec<(String, SignatureStatus, Option<AgreementStatus>)> {
        self.forced.lock().await.clone()
    }

    /// How many times the signatory list was read.
    pub fn signatory_reads(&self) -> usize {
        self.signatory_reads.load(Ordering::SeqCst)
    }
}

fn not_found(id: &str) -> LeasesignError {
    LeasesignError::NotFound {
        entity: "agreement".to_string(),
        key: id.to_string(),
    }
}

#[async_trait]
impl PluginAdapter for MemoryAgreementStore {
    fn name(&self) -> &str {
        "memory-agreements"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, LeasesignError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), LeasesignError> {
        Ok(())
    }
}

#[async_trait]
impl AgreementStore for MemoryAgreementStore {
    async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Agreement>, LeasesignError> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(LeasesignError::Storage {
                source: "injected lookup failure".into(),
            });
        }
        Ok(self
            .agreements
            .lock()
            .await
            .values()
            .find(|a| a.external_reference.as_deref() == Some(reference))
            .cloned())
    }

    async fn signatories(&self, agreement_id: &str) -> Result<Vec<Signatory>, LeasesignError> {
        self.signatory_reads.fetch_add(1, Ordering::SeqCst);
        self.agreements
            .lock()
            .await
            .get(agreement_id)
            .map(|a| a.signatories.clone())
            .ok_or_else(|| not_found(agreement_id))
    }

    async fn update_agreement(
        &self,
        agreement_id: &str,
        update: &AgreementUpdate,
        updated_at: &str,
    ) -> Result<(), LeasesignError> {
        if let Some(failure) = self.update_failure.lock().await.as_ref() {
            return Err(failure.to_error());
        }
        if update.signature_status == Some(SignatureStatus::Unknown) {
            return Err(WriteFailure::ConstraintViolation(
                "CHECK constraint failed: signature_status <> 'unknown'".to_string(),
            )
            .to_error());
        }

        let mut agreements = self.agreements.lock().await;
        let agreement = agreements
            .get_mut(agreement_id)
            .ok_or_else(|| not_found(agreement_id))?;
        if let Some(status) = update.status {
            agreement.status = status;
        }
        if let Some(signature_status) = &update.signature_status {
            agreement.signature_status = Some(signature_status.clone());
        }
        if let Some(signatories) = &update.signatories {
            agreement.signatories = signatories.clone();
        }
        if let Some(url) = &update.signed_document_url {
            agreement.signed_document_url = Some(url.clone());
        }
        if let Some(date) = &update.signed_date {
            agreement.signed_date = Some(date.clone());
        }
        agreement.updated_at = updated_at.to_string();
        drop(agreements);

        self.updates
            .lock()
            .await
            .push((agreement_id.to_string(), update.clone()));
        Ok(())
    }

    async fn force_signature_status(
        &self,
        agreement_id: &str,
        signature_status: &SignatureStatus,
        status: Option<AgreementStatus>,
        updated_at: &str,
    ) -> Result<(), LeasesignError> {
        if self.fail_forced.load(Ordering::SeqCst) {
            return Err(WriteFailure::Storage("injected narrow write failure".into()).to_error());
        }
        let mut agreements = self.agreements.lock().await;
        let agreement = agreements
            .get_mut(agreement_id)
            .ok_or_else(|| not_found(agreement_id))?;
        agreement.signature_status = Some(signature_status.clone());
        if let Some(status) = status {
            agreement.status = status;
        }
        agreement.updated_at = updated_at.to_string();
        drop(agreements);

        self.forced.lock().await.push((
            agreement_id.to_string(),
            signature_status.clone(),
            status,
        ));
        Ok(())
    }
}

/// A mock webhook event log.
#[derive(Default)]
pub struct MemoryEventLog {
    events: Mutex<Vec<StoredEvent>>,
    without_processed_column: AtomicBool,
    fail_appends: AtomicBool,
    append_attempts: AtomicUsize,
}

impl MemoryEventLog {
    /// Create an empty log that has a `processed` column.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a log that behaves like a schema without the `processed` column.
    pub fn without_processed_column() -> Self {
        let log = Self::default();
        log.without_processed_column.store(true, Ordering::SeqCst);
        log
    }

    /// Make every append fail with a storage error.
    pub fn fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    /// All stored events, oldest first.
    pub async fn events(&self) -> Vec<StoredEvent> {
        self.events.lock().await.clone()
    }

    /// Number of append calls, including rejected ones.
    pub fn append_attempts(&self) -> usize {
        self.append_attempts.load(Ordering::SeqCst)
    }

    fn missing_processed() -> LeasesignError {
        LeasesignError::UnsupportedField {
            table: "webhook_events".to_string(),
            field: "processed".to_string(),
        }
    }
}

#[async_trait]
impl PluginAdapter for MemoryEventLog {
    fn name(&self) -> &str {
        "memory-events"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, LeasesignError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), LeasesignError> {
        Ok(())
    }
}

#[async_trait]
impl EventLog for MemoryEventLog {
    async fn append_event(
        &self,
        event: &WebhookEvent,
        with_processed: bool,
    ) -> Result<String, LeasesignError> {
        let attempt = self.append_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(LeasesignError::Storage {
                source: "injected append failure".into(),
            });
        }
        let has_column = !self.without_processed_column.load(Ordering::SeqCst);
        if with_processed && !has_column {
            return Err(Self::missing_processed());
        }

        let id = format!("evt-{attempt}");
        self.events.lock().await.push(StoredEvent {
            id: id.clone(),
            received_at: format!("2026-01-01T00:00:{:02}.000Z", attempt % 60),
            processed: has_column.then_some(false),
            event: event.clone(),
        });
        Ok(id)
    }

    async fn mark_processed(&self, event_record_id: &str) -> Result<(), LeasesignError> {
        if self.without_processed_column.load(Ordering::SeqCst) {
            return Err(Self::missing_processed());
        }
        let mut events = self.events.lock().await;
        let stored = events
            .iter_mut()
            .find(|e| e.id == event_record_id)
            .ok_or_else(|| LeasesignError::NotFound {
                entity: "webhook event".to_string(),
                key: event_record_id.to_string(),
            })?;
        stored.processed = Some(true);
        Ok(())
    }

    async fn list_events(
        &self,
        request_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<StoredEvent>, LeasesignError> {
        Ok(self
            .events
            .lock()
            .await
            .iter()
            .filter(|e| request_id.is_none() || e.event.request_id.as_deref() == request_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payloads;

    #[tokio::test]
    async fn update_applies_fields_and_records_call() {
        let store = MemoryAgreementStore::new();
        store
            .insert(payloads::agreement("ag-1", "r1", AgreementStatus::Draft))
            .await;

        let update = AgreementUpdate {
            status: Some(AgreementStatus::PendingSignature),
            ..Default::default()
        };
        store.update_agreement("ag-1", &update, "T").await.unwrap();

        let stored = store.get("ag-1").await.unwrap();
        assert_eq!(stored.status, AgreementStatus::PendingSignature);
        assert_eq!(stored.updated_at, "T");
        assert_eq!(store.applied_updates().await.len(), 1);
    }

    #[tokio::test]
    async fn injected_failure_is_returned() {
        let store = MemoryAgreementStore::new();
        store
            .insert(payloads::agreement("ag-1", "r1", AgreementStatus::Draft))
            .await;
        store
            .fail_updates_with(Some(WriteFailure::UnsupportedField("signed_date".into())))
            .await;
        let err = store
            .update_agreement("ag-1", &AgreementUpdate::default(), "T")
            .await
            .unwrap_err();
        assert!(err.is_schema_rejection());
    }

    #[tokio::test]
    async fn event_log_without_processed_column() {
        let log = MemoryEventLog::without_processed_column();
        let event = WebhookEvent::from_value(payloads::sign_request_received("r1", "T1"));
        assert!(log.append_event(&event, true).await.is_err());
        let id = log.append_event(&event, false).await.unwrap();
        assert!(log.mark_processed(&id).await.is_err());
        assert_eq!(log.events().await[0].processed, None);
        assert_eq!(log.append_attempts(), 2);
    }
}
