// SPDX-FileCopyrightText: 2026 Leasesign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity and health shared by every external collaborator.

use async_trait::async_trait;

use crate::error::LeasesignError;
use crate::types::{AdapterType, HealthStatus};

/// Implemented by the relational store and the object store.
///
/// The gateway's `/health` route reports `name()` and `health_check()` for
/// each collaborator; the binary calls `shutdown()` once on exit.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Short backend name, e.g. `sqlite` or `local`.
    fn name(&self) -> &str;

    fn version(&self) -> semver::Version;

    fn adapter_type(&self) -> AdapterType;

    /// An `Err` is reported as unhealthy.
    async fn health_check(&self) -> Result<HealthStatus, LeasesignError>;

    /// Flush and release resources. Called at most once.
    async fn shutdown(&self) -> Result<(), LeasesignError>;
}
