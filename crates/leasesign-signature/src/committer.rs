// SPDX-FileCopyrightText: 2026 Leasesign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Applies agreement updates with a narrow status-only fallback.

use std::sync::Arc;

use leasesign_core::{AgreementStore, AgreementUpdate, LeasesignError};
use tracing::{debug, warn};

use crate::now_timestamp;

/// Which write path persisted the update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitPath {
    /// The full partial update.
    Primary,
    /// Only `signature_status` (and `status`) after the full update was
    /// rejected by the schema.
    Fallback,
}

impl std::fmt::Display for CommitPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommitPath::Primary => write!(f, "primary"),
            CommitPath::Fallback => write!(f, "fallback"),
        }
    }
}

#[derive(Clone)]
pub struct UpdateCommitter {
    store: Arc<dyn AgreementStore>,
}

impl UpdateCommitter {
    pub fn new(store: Arc<dyn AgreementStore>) -> Self {
        Self { store }
    }

    /// Write `update` to the agreement, stamping `updated_at`.
    ///
    /// When the schema rejects the full update and it carries a signature
    /// status, the narrow administrative write is tried instead. Every other
    /// failure is returned.
    pub async fn commit(
        &self,
        agreement_id: &str,
        update: AgreementUpdate,
    ) -> Result<CommitPath, LeasesignError> {
        let update = update.sanitize();
        let updated_at = now_timestamp();

        let err = match self
            .store
            .update_agreement(agreement_id, &update, &updated_at)
            .await
        {
            Ok(()) => {
                debug!(agreement_id, "agreement updated");
                return Ok(CommitPath::Primary);
            }
            Err(e) => e,
        };

        let Some(signature_status) = update.signature_status.as_ref() else {
            return Err(err);
        };
        if !err.is_schema_rejection() {
            return Err(err);
        }

        warn!(
            agreement_id,
            error = %err,
            signature_status = %signature_status,
            "agreement update rejected, falling back to status-only write"
        );
        self.store
            .force_signature_status(agreement_id, signature_status, update.status, &updated_at)
            .await?;
        Ok(CommitPath::Fallback)
    }
}
