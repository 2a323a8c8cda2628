// SPDX-FileCopyrightText: 2026 Leasesign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Write-ahead record of every received webhook event.
//!
//! Recording never fails the request. Duplicate deliveries are stored again.

use std::sync::Arc;

use leasesign_core::{EventLog, LeasesignError, StoredEvent, WebhookEvent};
use tracing::{debug, info, warn};

/// What happened when an event was recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordReceipt {
    pub stored: bool,
    /// Row id, when stored.
    pub id: Option<String>,
}

impl RecordReceipt {
    fn stored(id: String) -> Self {
        Self {
            stored: true,
            id: Some(id),
        }
    }

    fn not_stored() -> Self {
        Self {
            stored: false,
            id: None,
        }
    }
}

#[derive(Clone)]
pub struct EventRecorder {
    log: Arc<dyn EventLog>,
}

impl EventRecorder {
    pub fn new(log: Arc<dyn EventLog>) -> Self {
        Self { log }
    }

    /// Append `event` to the log.
    ///
    /// A schema without the `processed` column gets one retry that leaves
    /// the column out.
    pub async fn record(&self, event: &WebhookEvent) -> RecordReceipt {
        let request_id = event.request_id.as_deref().unwrap_or("-");
        let event_id = event.kind.code();

        let result = match self.log.append_event(event, true).await {
            Err(e) if is_missing_processed(&e) => {
                info!(request_id, "event log has no processed column, storing without it");
                self.log.append_event(event, false).await
            }
            other => other,
        };

        match result {
            Ok(id) => {
                debug!(request_id, event_id, record_id = %id, "webhook event recorded");
                RecordReceipt::stored(id)
            }
            Err(e) => {
                warn!(request_id, event_id, error = %e, "failed to record webhook event, continuing");
                RecordReceipt::not_stored()
            }
        }
    }

    /// Flag a recorded event as processed. Failures are logged and ignored.
    pub async fn mark_processed(&self, record_id: &str) {
        match self.log.mark_processed(record_id).await {
            Ok(()) => debug!(record_id, "webhook event marked processed"),
            Err(e) if is_missing_processed(&e) => {
                debug!(record_id, "event log has no processed column, skipping mark");
            }
            Err(e) => warn!(record_id, error = %e, "failed to mark webhook event processed"),
        }
    }

    /// Stored events, oldest first.
    pub async fn list(
        &self,
        request_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<StoredEvent>, LeasesignError> {
        self.log.list_events(request_id, limit).await
    }
}

fn is_missing_processed(err: &LeasesignError) -> bool {
    matches!(err, LeasesignError::UnsupportedField { field, .. } if field == "processed")
}
