// SPDX-FileCopyrightText: 2026 Leasesign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agreement and signatory types shared by storage, the signature pipeline,
//! and the gateway.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{Display, EnumString};
use tracing::warn;

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of collaborator behind an adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    ObjectStore,
}

/// Coarse lifecycle status of an agreement.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AgreementStatus {
    Draft,
    Review,
    PendingSignature,
    PartiallySigned,
    Signed,
    Active,
    Completed,
    Rejected,
    Cancelled,
    Expired,
}

impl AgreementStatus {
    /// Terminal agreements are immutable; edit flows outside this service
    /// must refuse to mutate them.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AgreementStatus::Signed
                | AgreementStatus::Completed
                | AgreementStatus::Rejected
                | AgreementStatus::Cancelled
                | AgreementStatus::Expired
        )
    }

    /// Whether the signing round is over, successfully or not.
    ///
    /// Signature events must never move such an agreement back to an
    /// earlier signing state.
    pub fn is_signature_settled(self) -> bool {
        self.is_terminal() || self == AgreementStatus::Active
    }
}

/// Fine-grained signature status stored alongside the coarse status.
///
/// Stored values written by other flows are preserved verbatim in
/// [`SignatureStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SignatureStatus {
    Pending,
    InProgress,
    Completed,
    /// `signed_by_<name>`.
    SignedBy(String),
    /// Rejected by the storage layer; never written.
    Unknown,
    Other(String),
}

impl fmt::Display for SignatureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureStatus::Pending => f.write_str("pending"),
            SignatureStatus::InProgress => f.write_str("in_progress"),
            SignatureStatus::Completed => f.write_str("completed"),
            SignatureStatus::SignedBy(name) => write!(f, "signed_by_{name}"),
            SignatureStatus::Unknown => f.write_str("unknown"),
            SignatureStatus::Other(raw) => f.write_str(raw),
        }
    }
}

impl FromStr for SignatureStatus {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "pending" => SignatureStatus::Pending,
            "in_progress" => SignatureStatus::InProgress,
            "completed" => SignatureStatus::Completed,
            "unknown" => SignatureStatus::Unknown,
            other => match other.strip_prefix("signed_by_") {
                Some(name) if !name.is_empty() => SignatureStatus::SignedBy(name.to_string()),
                _ => SignatureStatus::Other(other.to_string()),
            },
        })
    }
}

impl Serialize for SignatureStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SignatureStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let Ok(status) = raw.parse::<SignatureStatus>();
        Ok(status)
    }
}

/// Completion state of a single signatory.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SignatoryState {
    #[default]
    Pending,
    Completed,
}

/// One required signer of an agreement, identified by email
/// (case-insensitive).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signatory {
    #[serde(default)]
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub status: SignatoryState,
    #[serde(default, alias = "signed_at")]
    pub signed_at: Option<String>,
}

impl Signatory {
    /// Case-insensitive identity comparison.
    pub fn has_email(&self, email: &str) -> bool {
        self.email.trim().eq_ignore_ascii_case(email.trim())
    }
}

/// Decode a stored `signatories_status` column.
///
/// Anything other than a JSON array is treated as corruption and yields an
/// empty list. Array elements that are not signatory objects are dropped.
pub fn decode_signatories(raw: Option<&str>) -> Vec<Signatory> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "signatories_status is not valid JSON, treating as empty");
            return Vec::new();
        }
    };
    let serde_json::Value::Array(items) = value else {
        warn!(
            kind = json_kind(&value),
            "signatories_status is not a JSON array, treating as empty"
        );
        return Vec::new();
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Signatory>(item) {
            Ok(s) => Some(s),
            Err(e) => {
                warn!(error = %e, "dropping malformed signatory entry");
                None
            }
        })
        .collect()
}

/// Encode a signatory list for the `signatories_status` column.
pub fn encode_signatories(signatories: &[Signatory]) -> String {
    serde_json::to_string(signatories).unwrap_or_else(|_| "[]".to_string())
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// A rental agreement as seen by the signature lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agreement {
    pub id: String,
    pub property_id: Option<String>,
    pub rentee_id: Option<String>,
    /// Provider request id (`eviasignreference` column).
    pub external_reference: Option<String>,
    pub status: AgreementStatus,
    pub signature_status: Option<SignatureStatus>,
    pub signatories: Vec<Signatory>,
    pub signed_document_url: Option<String>,
    pub signed_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Partial update computed by the signature state machine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgreementUpdate {
    pub status: Option<AgreementStatus>,
    pub signature_status: Option<SignatureStatus>,
    pub signatories: Option<Vec<Signatory>>,
    pub signed_document_url: Option<String>,
    pub signed_date: Option<String>,
}

impl AgreementUpdate {
    /// Returns true when no field would be written.
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.signature_status.is_none()
            && self.signatories.is_none()
            && self.signed_document_url.is_none()
            && self.signed_date.is_none()
    }

    /// Drop values the storage layer must never receive.
    ///
    /// A `signature_status` of `unknown` violates the agreements check
    /// constraint and is removed from the update.
    pub fn sanitize(mut self) -> Self {
        if self.signature_status == Some(SignatureStatus::Unknown) {
            warn!("dropping signature_status=unknown from agreement update");
            self.signature_status = None;
        }
        self
    }
}
