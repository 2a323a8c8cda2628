// SPDX-FileCopyrightText: 2026 Leasesign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Relational storage traits for agreements and the webhook event log.

use async_trait::async_trait;

use crate::error::LeasesignError;
use crate::event::{StoredEvent, WebhookEvent};
use crate::traits::adapter::PluginAdapter;
use crate::types::{Agreement, AgreementStatus, AgreementUpdate, SignatureStatus, Signatory};

/// Access to the `agreements` table as needed by the signature lifecycle.
#[async_trait]
pub trait AgreementStore: PluginAdapter {
    /// Exact-match lookup on the provider reference.
    async fn find_by_reference(&self, reference: &str)
    -> Result<Option<Agreement>, LeasesignError>;

    /// Reads the current signatory list of an agreement.
    async fn signatories(&self, agreement_id: &str) -> Result<Vec<Signatory>, LeasesignError>;

    /// Applies a partial update keyed by agreement id.
    ///
    /// Returns [`LeasesignError::NotFound`] when no row matched,
    /// [`LeasesignError::UnsupportedField`] or
    /// [`LeasesignError::ConstraintViolation`] when the schema rejected it.
    async fn update_agreement(
        &self,
        agreement_id: &str,
        update: &AgreementUpdate,
        updated_at: &str,
    ) -> Result<(), LeasesignError>;

    /// Administrative status-only write used when a full update is rejected.
    async fn force_signature_status(
        &self,
        agreement_id: &str,
        signature_status: &SignatureStatus,
        status: Option<AgreementStatus>,
        updated_at: &str,
    ) -> Result<(), LeasesignError>;
}

/// Append-only log of received webhook events.
#[async_trait]
pub trait EventLog: PluginAdapter {
    /// Appends one event row and returns its id.
    ///
    /// When `with_processed` is false the optional `processed` column is left
    /// out of the insert.
    async fn append_event(
        &self,
        event: &WebhookEvent,
        with_processed: bool,
    ) -> Result<String, LeasesignError>;

    /// Flags an event row as processed.
    async fn mark_processed(&self, event_record_id: &str) -> Result<(), LeasesignError>;

    /// Lists stored events, oldest first, optionally filtered by request id.
    async fn list_events(
        &self,
        request_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<StoredEvent>, LeasesignError>;
}
