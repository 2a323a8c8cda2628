// SPDX-FileCopyrightText: 2026 Leasesign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Leasesign signature service.

use thiserror::Error;

/// The primary error type used across all Leasesign adapter traits and the
/// signature pipeline.
#[derive(Debug, Error)]
pub enum LeasesignError {
    /// Configuration errors (invalid TOML, missing credentials, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (connection failure, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The write referenced a column the deployed schema does not have.
    #[error("unsupported field `{field}` on table `{table}`")]
    UnsupportedField { table: String, field: String },

    /// The write was rejected by a schema constraint (CHECK, JSON validation).
    #[error("constraint violation on table `{table}`: {detail}")]
    ConstraintViolation { table: String, detail: String },

    /// A keyed record does not exist.
    #[error("{entity} not found: {key}")]
    NotFound { entity: String, key: String },

    /// Object storage errors (upload rejected, transport failure).
    #[error("object store error: {message}")]
    ObjectStore {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Webhook payload could not be interpreted.
    #[error("payload error: {0}")]
    Payload(String),

    /// HTTP gateway errors (bind failure, server error).
    #[error("gateway error: {message}")]
    Gateway {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LeasesignError {
    /// Whether this error means the write was rejected because the deployed
    /// schema disagrees with the shape of the update.
    pub fn is_schema_rejection(&self) -> bool {
        matches!(
            self,
            LeasesignError::UnsupportedField { .. } | LeasesignError::ConstraintViolation { .. }
        )
    }
}
