// SPDX-FileCopyrightText: 2026 Leasesign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The shared webhook processing pipeline.
//!
//! Every transport hands decoded events to [`SignaturePipeline::handle`] and
//! turns the [`Outcome`] into an [`Acknowledgment`]. Nothing in here panics
//! or returns an error to the transport: failures become
//! [`Disposition::Failed`].

use std::sync::Arc;

use leasesign_archive::DocumentArchiver;
use leasesign_core::{
    AgreementStore, EventKind, EventLog, LeasesignError, StoredEvent, WebhookEvent,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::committer::{CommitPath, UpdateCommitter};
use crate::machine::{self, NoChangeReason, Transition};
use crate::now_timestamp;
use crate::recorder::{EventRecorder, RecordReceipt};
use crate::resolver::{AgreementResolver, Resolution};

/// How an event was handled.
#[derive(Debug, Clone, PartialEq)]
pub enum Disposition {
    /// An update was written.
    Applied {
        agreement_id: String,
        path: CommitPath,
        document_url: Option<String>,
    },
    /// The agreement was found but nothing needed writing.
    Unchanged {
        agreement_id: String,
        reason: NoChangeReason,
    },
    /// No agreement carries this provider reference.
    AgreementNotFound { request_id: Option<String> },
    /// The event id is outside the handled taxonomy.
    Ignored { event_id: i64 },
    /// Lookup or commit failed.
    Failed { error: String },
}

impl Disposition {
    pub fn is_failure(&self) -> bool {
        matches!(self, Disposition::Failed { .. })
    }
}

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub receipt: RecordReceipt,
    pub disposition: Disposition,
}

/// JSON body returned to the provider. Always sent with HTTP 200.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgment {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_record_id: Option<String>,
    pub timestamp: String,
}

impl Acknowledgment {
    /// Failure acknowledgment for errors raised outside the pipeline.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
            event_record_id: None,
            timestamp: now_timestamp(),
        }
    }
}

impl From<&Outcome> for Acknowledgment {
    fn from(outcome: &Outcome) -> Self {
        let (success, message, error) = match &outcome.disposition {
            Disposition::Applied {
                agreement_id, path, ..
            } => {
                let message = match path {
                    CommitPath::Primary => format!("agreement {agreement_id} updated"),
                    CommitPath::Fallback => {
                        format!("agreement {agreement_id} signature status updated")
                    }
                };
                (true, Some(message), None)
            }
            Disposition::Unchanged {
                agreement_id,
                reason,
            } => (
                true,
                Some(format!("agreement {agreement_id} unchanged: {reason}")),
                None,
            ),
            Disposition::AgreementNotFound { request_id } => (
                true,
                Some(match request_id {
                    Some(id) => format!("no agreement found for request {id}"),
                    None => "event has no request id".to_string(),
                }),
                None,
            ),
            Disposition::Ignored { event_id } => (
                true,
                Some(format!("event id {event_id} ignored")),
                None,
            ),
            Disposition::Failed { error } => (false, None, Some(error.clone())),
        };

        Self {
            success,
            message,
            error,
            event_record_id: outcome.receipt.id.clone(),
            timestamp: now_timestamp(),
        }
    }
}

/// Record, resolve, transition, archive, commit.
#[derive(Clone)]
pub struct SignaturePipeline {
    recorder: EventRecorder,
    resolver: AgreementResolver,
    committer: UpdateCommitter,
    agreements: Arc<dyn AgreementStore>,
    archiver: DocumentArchiver,
}

impl SignaturePipeline {
    pub fn new(
        agreements: Arc<dyn AgreementStore>,
        events: Arc<dyn EventLog>,
        archiver: DocumentArchiver,
    ) -> Self {
        Self {
            recorder: EventRecorder::new(events),
            resolver: AgreementResolver::new(agreements.clone()),
            committer: UpdateCommitter::new(agreements.clone()),
            agreements,
            archiver,
        }
    }

    pub fn recorder(&self) -> &EventRecorder {
        &self.recorder
    }

    pub fn archiver(&self) -> &DocumentArchiver {
        &self.archiver
    }

    pub fn agreements(&self) -> &Arc<dyn AgreementStore> {
        &self.agreements
    }

    /// Handle a freshly received event: record it before any side effect.
    pub async fn handle(&self, event: &WebhookEvent) -> Outcome {
        let receipt = self.recorder.record(event).await;
        self.finish(receipt, event).await
    }

    /// Re-run a stored event without recording it again.
    pub async fn reprocess(&self, stored: &StoredEvent) -> Outcome {
        let receipt = RecordReceipt {
            stored: true,
            id: Some(stored.id.clone()),
        };
        self.finish(receipt, &stored.event).await
    }

    async fn finish(&self, receipt: RecordReceipt, event: &WebhookEvent) -> Outcome {
        let disposition = match self.process(event).await {
            Ok(disposition) => disposition,
            Err(e) => {
                warn!(
                    request_id = event.request_id.as_deref().unwrap_or("-"),
                    event_id = event.kind.code(),
                    error = %e,
                    "webhook processing failed"
                );
                Disposition::Failed {
                    error: e.to_string(),
                }
            }
        };

        if let Some(id) = receipt.id.as_deref().filter(|_| !disposition.is_failure()) {
            self.recorder.mark_processed(id).await;
        }

        Outcome {
            receipt,
            disposition,
        }
    }

    async fn process(&self, event: &WebhookEvent) -> Result<Disposition, LeasesignError> {
        if let EventKind::Unrecognized(code) = event.kind {
            info!(
                event_id = code,
                event_type = event.event_type.as_deref().unwrap_or("-"),
                "unrecognized webhook event, ignoring"
            );
            return Ok(Disposition::Ignored { event_id: code });
        }

        let Some(request_id) = event.request_id.as_deref() else {
            info!(event_id = event.kind.code(), "webhook event has no RequestId");
            return Ok(Disposition::AgreementNotFound { request_id: None });
        };

        let agreement = match self.resolver.resolve(request_id).await? {
            Resolution::Found(agreement) => agreement,
            Resolution::NotFound => {
                return Ok(Disposition::AgreementNotFound {
                    request_id: Some(request_id.to_string()),
                });
            }
        };

        let signatories = if event.kind == EventKind::SignatoryCompleted {
            match self.agreements.signatories(&agreement.id).await {
                Ok(list) => list,
                Err(e) => {
                    warn!(agreement_id = %agreement.id, error = %e, "signatory re-read failed, using resolved list");
                    agreement.signatories.clone()
                }
            }
        } else {
            agreement.signatories.clone()
        };

        let (mut update, document) =
            match machine::transition(&agreement, event, &signatories, &now_timestamp()) {
                Transition::Apply { update, document } => (update, document),
                Transition::NoChange(reason) => {
                    info!(agreement_id = %agreement.id, %reason, "no agreement change");
                    return Ok(Disposition::Unchanged {
                        agreement_id: agreement.id,
                        reason,
                    });
                }
            };

        if let Some(document) = document {
            update.signed_document_url = self
                .archiver
                .archive(document.content.as_deref(), &agreement.id)
                .await;
        }
        let document_url = update.signed_document_url.clone();

        let path = self.committer.commit(&agreement.id, update).await?;
        info!(
            agreement_id = %agreement.id,
            request_id,
            event = event.kind.name(),
            path = %path,
            "agreement signature state advanced"
        );
        debug!(agreement_id = %agreement.id, document_url = ?document_url, "commit details");

        Ok(Disposition::Applied {
            agreement_id: agreement.id,
            path,
            document_url,
        })
    }
}
