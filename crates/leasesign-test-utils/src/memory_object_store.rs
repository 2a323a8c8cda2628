// SPDX-FileCopyrightText: 2026 Leasesign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Object store that keeps uploads in memory.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use leasesign_core::{AdapterType, HealthStatus, LeasesignError, ObjectStore, PluginAdapter};

/// A stored object: bytes and content type.
pub type StoredObject = (Vec<u8>, String);

/// A mock object store for testing document archiving.
///
/// Captures every upload by path so tests can assert on what was stored.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, StoredObject>>,
    fail_uploads: AtomicBool,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every upload fail with an object store error.
    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    /// Object stored at `path`, if any.
    pub async fn object(&self, path: &str) -> Option<StoredObject> {
        self.objects.lock().await.get(path).cloned()
    }

    /// All stored paths, sorted.
    pub async fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.objects.lock().await.keys().cloned().collect();
        paths.sort();
        paths
    }
}

#[async_trait]
impl PluginAdapter for MemoryObjectStore {
    fn name(&self) -> &str {
        "memory-objects"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ObjectStore
    }

    async fn health_check(&self) -> Result<HealthStatus, LeasesignError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Ok(HealthStatus::Unhealthy("uploads are failing".to_string()));
        }
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), LeasesignError> {
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<(), LeasesignError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(LeasesignError::ObjectStore {
                message: "injected upload failure".to_string(),
                source: None,
            });
        }
        let mut objects = self.objects.lock().await;
        if !upsert && objects.contains_key(path) {
            return Err(LeasesignError::ObjectStore {
                message: format!("object `{path}` already exists"),
                source: None,
            });
        }
        objects.insert(path.to_string(), (bytes, content_type.to_string()));
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("memory://documents/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_uploads() {
        let store = MemoryObjectStore::new();
        store
            .upload("a/b.pdf", b"%PDF".to_vec(), "application/pdf", true)
            .await
            .unwrap();
        let (bytes, content_type) = store.object("a/b.pdf").await.unwrap();
        assert_eq!(bytes, b"%PDF");
        assert_eq!(content_type, "application/pdf");
        assert_eq!(store.public_url("a/b.pdf"), "memory://documents/a/b.pdf");
    }

    #[tokio::test]
    async fn injected_failure() {
        let store = MemoryObjectStore::new();
        store.fail_uploads(true);
        assert!(store.upload("x", vec![1], "application/pdf", true).await.is_err());
        assert!(store.paths().await.is_empty());
    }
}
