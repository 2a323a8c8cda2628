// SPDX-FileCopyrightText: 2026 Leasesign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `leasesign serve` command implementation and shared service wiring.
//!
//! Collaborators are constructed once here and passed into the pipeline.
//! A misconfigured object store fails at boot, not on the first completed
//! agreement.

use std::path::PathBuf;
use std::sync::Arc;

use leasesign_archive::{DocumentArchiver, object_store_from_config};
use leasesign_config::LeasesignConfig;
use leasesign_config::model::DocumentBackend;
use leasesign_core::{HealthStatus, LeasesignError, PluginAdapter};
use leasesign_gateway::{AuthConfig, GatewayState, HealthState, ServerConfig};
use leasesign_signature::SignaturePipeline;
use leasesign_storage::SqliteStorage;
use tracing::{debug, info, warn};

use crate::shutdown;

/// Storage plus the pipeline built on top of it.
pub struct Services {
    pub storage: Arc<SqliteStorage>,
    pub pipeline: SignaturePipeline,
}

impl Services {
    pub async fn build(config: &LeasesignConfig) -> Result<Self, LeasesignError> {
        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;
        let storage = Arc::new(storage);

        let store = object_store_from_config(&config.documents)?;
        match store.health_check().await {
            Ok(HealthStatus::Healthy) => debug!(store = store.name(), "object store ready"),
            Ok(status) => warn!(store = store.name(), ?status, "object store not healthy at startup"),
            Err(e) => warn!(store = store.name(), error = %e, "object store health check failed"),
        }

        let archiver = DocumentArchiver::new(store, &config.documents.path_prefix);
        let pipeline = SignaturePipeline::new(storage.clone(), storage.clone(), archiver);
        Ok(Self { storage, pipeline })
    }

    pub async fn shutdown(&self) {
        if let Err(e) = self.storage.shutdown().await {
            warn!(error = %e, "storage shutdown failed");
        }
    }
}

/// Runs the `leasesign serve` command until SIGINT/SIGTERM.
pub async fn run_serve(config: LeasesignConfig) -> Result<(), LeasesignError> {
    info!(service = %config.service.name, "starting leasesign serve");

    let services = Services::build(&config).await?;

    let documents_dir = match config.documents.backend {
        DocumentBackend::Local => Some(PathBuf::from(&config.documents.local_dir)),
        DocumentBackend::Http => None,
    };
    let server_config = ServerConfig {
        host: config.gateway.host.clone(),
        port: config.gateway.port,
        webhook_path: config.gateway.webhook_path.clone(),
        bearer_token: config.gateway.bearer_token.clone(),
        documents_dir,
    };
    let state = GatewayState {
        pipeline: services.pipeline.clone(),
        auth: AuthConfig {
            bearer_token: config.gateway.bearer_token.clone(),
        },
        health: HealthState {
            start_time: std::time::Instant::now(),
        },
        service_name: config.service.name.clone(),
        webhook_path: config.gateway.webhook_path.clone(),
    };

    let cancel = shutdown::install_signal_handler();
    let served = leasesign_gateway::start_server(&server_config, state, cancel).await;

    services.shutdown().await;
    info!("leasesign serve stopped");
    served
}
