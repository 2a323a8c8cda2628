// SPDX-FileCopyrightText: 2026 Leasesign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for a Supabase-compatible storage REST API.
//!
//! Uploads go to `POST <endpoint>/storage/v1/object/<bucket>/<path>` and
//! public objects are served from
//! `<endpoint>/storage/v1/object/public/<bucket>/<path>`. Every path
//! segment is percent-encoded, so agreement ids may hold any character.

use std::time::Duration;

use async_trait::async_trait;
use leasesign_core::{AdapterType, HealthStatus, LeasesignError, ObjectStore, PluginAdapter};
use reqwest::Url;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::{debug, warn};

/// Object store speaking the Supabase storage API.
#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    client: reqwest::Client,
    /// Always a base URL (`cannot_be_a_base` is false).
    endpoint: Url,
    bucket: String,
}

impl HttpObjectStore {
    /// Creates a storage client authenticated with a service key.
    ///
    /// The key is sent both as a bearer token and as the `apikey` header.
    pub fn new(
        endpoint: &str,
        bucket: &str,
        api_key: &str,
        timeout_secs: u64,
    ) -> Result<Self, LeasesignError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| LeasesignError::Config(format!("invalid storage endpoint `{endpoint}`: {e}")))?;
        if endpoint.cannot_be_a_base() {
            return Err(LeasesignError::Config(format!(
                "storage endpoint `{endpoint}` cannot carry a path"
            )));
        }

        let mut headers = HeaderMap::new();
        let mut bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| LeasesignError::Config(format!("invalid storage API key: {e}")))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);
        let mut apikey = HeaderValue::from_str(api_key)
            .map_err(|e| LeasesignError::Config(format!("invalid storage API key: {e}")))?;
        apikey.set_sensitive(true);
        headers.insert("apikey", apikey);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| LeasesignError::ObjectStore {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            endpoint,
            bucket: bucket.to_string(),
        })
    }

    /// `<endpoint>/storage/v1/<route...>/<bucket>/<path...>`, each segment encoded.
    fn storage_url(&self, route: &[&str], path: &str) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["storage", "v1"])
                .extend(route)
                .push(&self.bucket)
                .extend(path.split('/').filter(|s| !s.is_empty()));
        }
        url
    }
}

#[async_trait]
impl PluginAdapter for HttpObjectStore {
    fn name(&self) -> &str {
        "supabase-storage"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ObjectStore
    }

    async fn health_check(&self) -> Result<HealthStatus, LeasesignError> {
        let url = self.storage_url(&["bucket"], "");
        match self.client.get(url).send().await {
            Ok(response) if response.status().is_success() => Ok(HealthStatus::Healthy),
            Ok(response) => Ok(HealthStatus::Degraded(format!(
                "bucket lookup returned {}",
                response.status()
            ))),
            Err(e) => Ok(HealthStatus::Unhealthy(format!("storage unreachable: {e}"))),
        }
    }

    async fn shutdown(&self) -> Result<(), LeasesignError> {
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<(), LeasesignError> {
        let url = self.storage_url(&["object"], path);
        let len = bytes.len();
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", if upsert { "true" } else { "false" })
            .body(bytes)
            .send()
            .await
            .map_err(|e| LeasesignError::ObjectStore {
                message: format!("upload request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if status.is_success() {
            debug!(path, bytes = len, "uploaded object");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        warn!(status = %status, path, "storage rejected upload");
        Err(LeasesignError::ObjectStore {
            message: format!("storage returned {status}: {body}"),
            source: None,
        })
    }

    fn public_url(&self, path: &str) -> String {
        self.storage_url(&["object", "public"], path).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_bytes, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_store(endpoint: &str) -> HttpObjectStore {
        HttpObjectStore::new(endpoint, "agreements", "service-key", 5).unwrap()
    }

    #[tokio::test]
    async fn upload_posts_with_auth_and_upsert_headers() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/storage/v1/object/agreements/signed/ag-1/a.pdf"))
            .and(header("authorization", "Bearer service-key"))
            .and(header("apikey", "service-key"))
            .and(header("x-upsert", "true"))
            .and(header("content-type", "application/pdf"))
            .and(body_bytes(b"%PDF".to_vec()))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"Key":"agreements/signed/ag-1/a.pdf"}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let store = test_store(&server.uri());
        store
            .upload("signed/ag-1/a.pdf", b"%PDF".to_vec(), "application/pdf", true)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn rejected_upload_is_an_object_store_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("new row violates policy"))
            .mount(&server)
            .await;

        let store = test_store(&server.uri());
        let err = store
            .upload("x.pdf", b"%PDF".to_vec(), "application/pdf", true)
            .await
            .unwrap_err();
        match err {
            LeasesignError::ObjectStore { message, .. } => {
                assert!(message.contains("403"), "got {message}");
                assert!(message.contains("violates policy"));
            }
            other => panic!("expected ObjectStore error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn health_check_reports_bucket_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/storage/v1/bucket/agreements"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let store = test_store(&server.uri());
        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);

        let missing = HttpObjectStore::new(&server.uri(), "other", "service-key", 5).unwrap();
        assert!(matches!(
            missing.health_check().await.unwrap(),
            HealthStatus::Degraded(_)
        ));
    }

    #[tokio::test]
    async fn upload_encodes_unusual_agreement_ids() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/storage/v1/object/agreements/signed/ag%201%23x%3Fy/a.pdf"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let store = test_store(&server.uri());
        store
            .upload("signed/ag 1#x?y/a.pdf", b"%PDF".to_vec(), "application/pdf", true)
            .await
            .unwrap();
    }

    #[test]
    fn public_url_encodes_segments() {
        let store = test_store("https://abc.supabase.co");
        assert_eq!(
            store.public_url("signed/ag 1#x?y/a.pdf"),
            "https://abc.supabase.co/storage/v1/object/public/agreements/signed/ag%201%23x%3Fy/a.pdf"
        );
    }

    #[test]
    fn invalid_endpoint_is_a_config_error() {
        assert!(matches!(
            HttpObjectStore::new("not a url", "agreements", "k", 5),
            Err(LeasesignError::Config(_))
        ));
        assert!(matches!(
            HttpObjectStore::new("mailto:ops@example.com", "agreements", "k", 5),
            Err(LeasesignError::Config(_))
        ));
    }

    #[test]
    fn public_url_uses_public_prefix() {
        let store = test_store("https://abc.supabase.co/");
        assert_eq!(
            store.public_url("signed/ag-1/a.pdf"),
            "https://abc.supabase.co/storage/v1/object/public/agreements/signed/ag-1/a.pdf"
        );
    }
}
