// SPDX-FileCopyrightText: 2026 Leasesign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod object_store;
pub mod storage;

pub use adapter::PluginAdapter;
pub use object_store::ObjectStore;
pub use storage::{AgreementStore, EventLog};
