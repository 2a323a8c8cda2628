// SPDX-FileCopyrightText: 2026 Leasesign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as route shapes, non-empty paths, and backend credential pairing.

use crate::diagnostic::ConfigError;
use crate::model::{DocumentBackend, LeasesignConfig};

/// Paths the gateway reserves for itself.
const RESERVED_PATHS: [&str; 2] = ["/health", "/documents"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &LeasesignConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let host = config.gateway.host.trim();
    if host.is_empty() {
        fail("gateway.host must not be empty".to_string());
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            fail(format!(
                "gateway.host `{host}` is not a valid IP address or hostname"
            ));
        }
    }

    let webhook_path = config.gateway.webhook_path.as_str();
    if !webhook_path.starts_with('/') || webhook_path.len() < 2 {
        fail(format!(
            "gateway.webhook_path must be an absolute route like `/webhooks/esign`, got `{webhook_path}`"
        ));
    } else if RESERVED_PATHS
        .iter()
        .any(|reserved| webhook_path == *reserved || webhook_path.starts_with(&format!("{reserved}/")))
    {
        fail(format!(
            "gateway.webhook_path `{webhook_path}` collides with a reserved route"
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    let docs = &config.documents;
    if docs.bucket.trim().is_empty() {
        fail("documents.bucket must not be empty".to_string());
    } else if docs.bucket.contains('/') {
        fail(format!(
            "documents.bucket `{}` must not contain `/`",
            docs.bucket
        ));
    }

    if docs.timeout_secs == 0 {
        fail("documents.timeout_secs must be greater than 0".to_string());
    }

    match docs.backend {
        DocumentBackend::Local => {
            if docs.local_dir.trim().is_empty() {
                fail("documents.local_dir must not be empty for the local backend".to_string());
            }
        }
        DocumentBackend::Http => {
            if is_blank(docs.endpoint.as_deref()) {
                fail("documents.endpoint is required for the http backend".to_string());
            }
            if is_blank(docs.api_key.as_deref()) {
                fail("documents.api_key is required for the http backend".to_string());
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}
