// SPDX-FileCopyrightText: 2026 Leasesign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP webhook ingress.
//!
//! The gateway accepts e-signature provider callbacks, hands them to the
//! shared [`SignaturePipeline`](leasesign_signature::SignaturePipeline) and
//! always answers HTTP 200 so the provider never retries a delivery that
//! was already recorded.

pub mod auth;
pub mod handlers;
pub mod server;

pub use auth::{AuthConfig, BearerOutcome};
pub use server::{GatewayState, HealthState, ServerConfig, build_router, start_server};
