// SPDX-FileCopyrightText: 2026 Leasesign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Leasesign signature service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Leasesign configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LeasesignConfig {
    /// Service identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Webhook HTTP gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Signed document object storage settings.
    #[serde(default)]
    pub documents: DocumentsConfig,
}

/// Service identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Name reported in the webhook capability descriptor.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "leasesign".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Webhook gateway configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Route receiving provider callbacks (POST) and the descriptor (GET).
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,

    /// Optional bearer token. Checked when the provider sends one, never
    /// required.
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            webhook_path: default_webhook_path(),
            bearer_token: None,
        }
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("webhook_path", &self.webhook_path)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8787
}

fn default_webhook_path() -> String {
    "/webhooks/esign".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("leasesign").join("leasesign.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("leasesign.db"))
        .display()
        .to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Object storage backend for signed documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentBackend {
    /// Files under `local_dir`, served by the gateway under `/documents`.
    #[default]
    Local,
    /// Supabase-compatible storage REST API.
    Http,
}

/// Signed document storage configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentsConfig {
    /// Which object store implementation to use.
    #[serde(default)]
    pub backend: DocumentBackend,

    /// Bucket holding signed agreements.
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Prefix for object paths inside the bucket.
    #[serde(default = "default_path_prefix")]
    pub path_prefix: String,

    /// Root directory for the local backend.
    #[serde(default = "default_local_dir")]
    pub local_dir: String,

    /// Base URL under which local documents are publicly reachable.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    /// Storage API endpoint for the http backend (e.g. `https://xyz.supabase.co`).
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Service key for the http backend.
    #[serde(default)]
    pub api_key: Option<String>,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            backend: DocumentBackend::default(),
            bucket: default_bucket(),
            path_prefix: default_path_prefix(),
            local_dir: default_local_dir(),
            public_base_url: default_public_base_url(),
            endpoint: None,
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for DocumentsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentsConfig")
            .field("backend", &self.backend)
            .field("bucket", &self.bucket)
            .field("path_prefix", &self.path_prefix)
            .field("local_dir", &self.local_dir)
            .field("public_base_url", &self.public_base_url)
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_bucket() -> String {
    "agreements".to_string()
}

fn default_path_prefix() -> String {
    "signed".to_string()
}

fn default_local_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("leasesign").join("documents"))
        .unwrap_or_else(|| std::path::PathBuf::from("documents"))
        .display()
        .to_string()
}

fn default_public_base_url() -> String {
    format!("http://{}:{}/documents", default_host(), default_port())
}

fn default_timeout_secs() -> u64 {
    30
}
