// SPDX-FileCopyrightText: 2026 Leasesign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Leasesign integration tests.
//!
//! Provides in-memory collaborators and payload builders for fast,
//! deterministic tests without SQLite or an object storage service.
//!
//! # Components
//!
//! - [`MemoryAgreementStore`] - agreement table with injectable write failures
//! - [`MemoryEventLog`] - event log that can simulate a missing `processed` column
//! - [`MemoryObjectStore`] - object store capturing uploads
//! - [`payloads`] - provider webhook bodies and seed agreements

pub mod memory_object_store;
pub mod memory_store;
pub mod payloads;

pub use memory_object_store::MemoryObjectStore;
pub use memory_store::{MemoryAgreementStore, MemoryEventLog, WriteFailure};
