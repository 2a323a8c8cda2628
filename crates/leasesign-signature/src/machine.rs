// SPDX-FileCopyrightText: 2026 Leasesign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signature state machine.
//!
//! A pure function from (agreement, event, current signatories) to the
//! partial update the committer should write. No I/O happens here; the
//! pipeline supplies the freshly read signatory list and resolves the
//! document into a URL.
//!
//! ```text
//! draft -> pending_signature -> partially_signed -> signed
//! ```
//!
//! Events apply last-write-wins, except that an agreement whose status is
//! settled (terminal or `active`) is never moved backwards. RequestCompleted
//! still applies to a `signed` agreement so a redelivery refreshes the
//! signed date and document.

use leasesign_core::{
    Agreement, AgreementStatus, AgreementUpdate, EventKind, SignatoryState, Signatory,
    SignatureStatus, WebhookEvent,
};

/// Result of applying one event to one agreement.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Write `update`. When `document` is set, the archiver runs first and
    /// its URL (if any) is added to the update.
    Apply {
        update: AgreementUpdate,
        document: Option<PendingDocument>,
    },
    /// Nothing to write.
    NoChange(NoChangeReason),
}

/// The document attached to a RequestCompleted event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDocument {
    /// Base64 content of the first attached document, if it had any.
    pub content: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoChangeReason {
    /// The event id is outside the handled taxonomy.
    UnrecognizedEvent(i64),
    /// The agreement already left the signing flow.
    AlreadySettled(AgreementStatus),
}

impl std::fmt::Display for NoChangeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoChangeReason::UnrecognizedEvent(code) => write!(f, "unrecognized event id {code}"),
            NoChangeReason::AlreadySettled(status) => {
                write!(f, "agreement is already {status}")
            }
        }
    }
}

/// Compute the transition for `event` against `agreement`.
///
/// `signatories` is the list read immediately before the call; it replaces
/// `agreement.signatories` for SignatoryCompleted. `now` is used as the
/// signed date when a completion event carries no time.
pub fn transition(
    agreement: &Agreement,
    event: &WebhookEvent,
    signatories: &[Signatory],
    now: &str,
) -> Transition {
    let settled = agreement.status.is_signature_settled();

    match event.kind {
        EventKind::SignRequestReceived => {
            if settled {
                return Transition::NoChange(NoChangeReason::AlreadySettled(agreement.status));
            }
            Transition::Apply {
                update: AgreementUpdate {
                    status: Some(AgreementStatus::PendingSignature),
                    signature_status: Some(SignatureStatus::Pending),
                    signatories: Some(Vec::new()),
                    ..Default::default()
                },
                document: None,
            }
        }
        EventKind::SignatoryCompleted => {
            let signatories = event.actor_email.as_deref().map(|email| {
                record_completion(
                    signatories,
                    event.actor_name.as_deref(),
                    email,
                    event.event_time.as_deref(),
                )
            });

            if settled {
                return match signatories {
                    Some(list) => Transition::Apply {
                        update: AgreementUpdate {
                            signatories: Some(list),
                            ..Default::default()
                        },
                        document: None,
                    },
                    None => Transition::NoChange(NoChangeReason::AlreadySettled(agreement.status)),
                };
            }

            Transition::Apply {
                update: AgreementUpdate {
                    status: Some(AgreementStatus::PartiallySigned),
                    signature_status: Some(SignatureStatus::InProgress),
                    signatories,
                    ..Default::default()
                },
                document: None,
            }
        }
        EventKind::RequestCompleted => {
            // A redelivery to a signed agreement refreshes it; any later state stays put.
            if settled && agreement.status != AgreementStatus::Signed {
                return Transition::NoChange(NoChangeReason::AlreadySettled(agreement.status));
            }
            let document = (!event.documents.is_empty()).then(|| PendingDocument {
                content: event.first_document_content().map(str::to_string),
            });
            Transition::Apply {
                update: AgreementUpdate {
                    status: Some(AgreementStatus::Signed),
                    signature_status: Some(SignatureStatus::Completed),
                    signed_date: Some(
                        event
                            .event_time
                            .clone()
                            .unwrap_or_else(|| now.to_string()),
                    ),
                    ..Default::default()
                },
                document,
            }
        }
        EventKind::Unrecognized(code) => {
            Transition::NoChange(NoChangeReason::UnrecognizedEvent(code))
        }
    }
}

/// Find-or-append the signatory for `email` and mark it completed.
///
/// Matching is case-insensitive, so repeated deliveries update one entry
/// in place. The name is refreshed only when the event carries one.
pub fn record_completion(
    signatories: &[Signatory],
    name: Option<&str>,
    email: &str,
    signed_at: Option<&str>,
) -> Vec<Signatory> {
    let mut list = signatories.to_vec();
    let name = name.map(str::trim).filter(|n| !n.is_empty());

    match list.iter_mut().find(|s| s.has_email(email)) {
        Some(entry) => {
            entry.status = SignatoryState::Completed;
            if let Some(at) = signed_at {
                entry.signed_at = Some(at.to_string());
            }
            if let Some(name) = name {
                entry.name = name.to_string();
            }
        }
        None => list.push(Signatory {
            name: name.unwrap_or_default().to_string(),
            email: email.trim().to_string(),
            status: SignatoryState::Completed,
            signed_at: signed_at.map(str::to_string),
        }),
    }
    list
}
