// SPDX-FileCopyrightText: 2026 Leasesign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Object storage trait for signed agreement documents.

use async_trait::async_trait;

use crate::error::LeasesignError;
use crate::traits::adapter::PluginAdapter;

/// Durable object storage with upsert uploads and public URLs.
#[async_trait]
pub trait ObjectStore: PluginAdapter {
    /// Uploads `bytes` to `path`. With `upsert`, an existing object is replaced.
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<(), LeasesignError>;

    /// Public URL under which `path` can be retrieved.
    fn public_url(&self, path: &str) -> String;
}
