// SPDX-FileCopyrightText: 2026 Leasesign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filesystem object store.
//!
//! Objects live at `<root>/<bucket>/<path>`. The gateway serves `<root>`
//! under `/documents`, so `public_base_url` normally points there.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use leasesign_core::{AdapterType, HealthStatus, LeasesignError, ObjectStore, PluginAdapter};
use reqwest::Url;
use tracing::debug;

/// Object store backed by a local directory.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
    bucket: String,
    public_base_url: String,
}

impl LocalObjectStore {
    pub fn new(root: impl AsRef<Path>, bucket: &str, public_base_url: &str) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            bucket: bucket.to_string(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Directory holding the bucket's objects.
    pub fn bucket_dir(&self) -> PathBuf {
        self.root.join(&self.bucket)
    }

    /// Filesystem location of an object path, refusing anything that would
    /// escape the bucket directory.
    pub fn object_file(&self, path: &str) -> Result<PathBuf, LeasesignError> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if path.is_empty() || escapes {
            return Err(LeasesignError::ObjectStore {
                message: format!("invalid object path `{path}`"),
                source: None,
            });
        }
        Ok(self.bucket_dir().join(relative))
    }
}

fn io_error(message: String, e: std::io::Error) -> LeasesignError {
    LeasesignError::ObjectStore {
        message,
        source: Some(Box::new(e)),
    }
}

#[async_trait]
impl PluginAdapter for LocalObjectStore {
    fn name(&self) -> &str {
        "local"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ObjectStore
    }

    async fn health_check(&self) -> Result<HealthStatus, LeasesignError> {
        let dir = self.bucket_dir();
        match tokio::fs::create_dir_all(&dir).await {
            Ok(()) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "cannot use {}: {e}",
                dir.display()
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), LeasesignError> {
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<(), LeasesignError> {
        let file = self.object_file(path)?;
        if let Some(parent) = file.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(format!("failed to create {}", parent.display()), e))?;
        }

        if !upsert && tokio::fs::try_exists(&file).await.unwrap_or(false) {
            return Err(LeasesignError::ObjectStore {
                message: format!("object `{path}` already exists"),
                source: None,
            });
        }

        let len = bytes.len();
        tokio::fs::write(&file, bytes)
            .await
            .map_err(|e| io_error(format!("failed to write {}", file.display()), e))?;
        debug!(path, content_type, bytes = len, "stored object locally");
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        let mut url = match Url::parse(&self.public_base_url) {
            Ok(url) if !url.cannot_be_a_base() => url,
            _ => return format!("{}/{}/{}", self.public_base_url, self.bucket, path),
        };
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push(&self.bucket)
                .extend(path.split('/').filter(|s| !s.is_empty()));
        }
        url.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn upload_writes_under_bucket() {
        let dir = tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path(), "agreements", "http://localhost/documents/");

        store
            .upload("signed/ag-1/a.pdf", b"%PDF-1.4".to_vec(), "application/pdf", true)
            .await
            .unwrap();

        let written = std::fs::read(dir.path().join("agreements/signed/ag-1/a.pdf")).unwrap();
        assert_eq!(written, b"%PDF-1.4");
        assert_eq!(
            store.public_url("signed/ag-1/a.pdf"),
            "http://localhost/documents/agreements/signed/ag-1/a.pdf"
        );
    }

    #[tokio::test]
    async fn upsert_overwrites_and_plain_upload_refuses() {
        let dir = tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path(), "agreements", "http://localhost");

        store.upload("x.pdf", b"one".to_vec(), "application/pdf", true).await.unwrap();
        store.upload("x.pdf", b"two".to_vec(), "application/pdf", true).await.unwrap();
        assert_eq!(std::fs::read(dir.path().join("agreements/x.pdf")).unwrap(), b"two");

        let err = store
            .upload("x.pdf", b"three".to_vec(), "application/pdf", false)
            .await
            .unwrap_err();
        assert!(matches!(err, LeasesignError::ObjectStore { .. }));
    }

    #[test]
    fn traversal_paths_are_rejected() {
        let store = LocalObjectStore::new("/tmp/docs", "agreements", "http://localhost");
        assert!(store.object_file("../etc/passwd").is_err());
        assert!(store.object_file("/abs.pdf").is_err());
        assert!(store.object_file("").is_err());
        assert!(store.object_file("signed/ag-1/ok.pdf").is_ok());
    }

    #[test]
    fn public_url_encodes_segments() {
        let store = LocalObjectStore::new("/tmp/docs", "agreements", "http://localhost/documents");
        assert_eq!(
            store.public_url("signed/ag 1#x?y/a.pdf"),
            "http://localhost/documents/agreements/signed/ag%201%23x%3Fy/a.pdf"
        );
    }

    #[tokio::test]
    async fn health_check_creates_bucket_dir() {
        let dir = tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path().join("docs"), "agreements", "http://localhost");
        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
        assert!(dir.path().join("docs/agreements").is_dir());
    }
}
