// SPDX-FileCopyrightText: 2026 Leasesign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signed agreement document archiving.
//!
//! [`DocumentArchiver`] turns the base64 payload carried by a completed
//! signature request into a stored PDF and a public URL. Storage goes through
//! the [`ObjectStore`](leasesign_core::ObjectStore) trait with two backends:
//! a local directory and a Supabase-compatible storage REST API.

pub mod archiver;
pub mod http;
pub mod local;

use std::sync::Arc;

use leasesign_config::model::{DocumentBackend, DocumentsConfig};
use leasesign_core::{LeasesignError, ObjectStore};

pub use archiver::DocumentArchiver;
pub use http::HttpObjectStore;
pub use local::LocalObjectStore;

/// Build the configured object store backend.
///
/// Credentials are checked here so a misconfigured backend fails at boot,
/// not on the first completed agreement.
pub fn object_store_from_config(
    config: &DocumentsConfig,
) -> Result<Arc<dyn ObjectStore>, LeasesignError> {
    match config.backend {
        DocumentBackend::Local => Ok(Arc::new(LocalObjectStore::new(
            &config.local_dir,
            &config.bucket,
            &config.public_base_url,
        ))),
        DocumentBackend::Http => {
            let endpoint = config.endpoint.as_deref().ok_or_else(|| {
                LeasesignError::Config("documents.endpoint is required for the http backend".into())
            })?;
            let api_key = config.api_key.as_deref().ok_or_else(|| {
                LeasesignError::Config("documents.api_key is required for the http backend".into())
            })?;
            Ok(Arc::new(HttpObjectStore::new(
                endpoint,
                &config.bucket,
                api_key,
                config.timeout_secs,
            )?))
        }
    }
}
