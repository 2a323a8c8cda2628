// SPDX-FileCopyrightText: 2026 Leasesign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Observe-only bearer token check for the webhook route.
//!
//! The provider may or may not send `Authorization: Bearer <token>`. The
//! outcome is logged and attached to the request; it never rejects.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

/// Bearer token configuration for the gateway.
#[derive(Clone, Default)]
pub struct AuthConfig {
    /// Expected bearer token. `None` disables the check.
    pub bearer_token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

/// Result of comparing the request's bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BearerOutcome {
    Verified,
    Mismatch,
    /// A token is configured but the request carried none.
    Absent,
    NotConfigured,
}

impl std::fmt::Display for BearerOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BearerOutcome::Verified => write!(f, "verified"),
            BearerOutcome::Mismatch => write!(f, "mismatch"),
            BearerOutcome::Absent => write!(f, "absent"),
            BearerOutcome::NotConfigured => write!(f, "not_configured"),
        }
    }
}

impl AuthConfig {
    pub fn check(&self, headers: &HeaderMap) -> BearerOutcome {
        let Some(expected) = self.bearer_token.as_deref() else {
            return BearerOutcome::NotConfigured;
        };
        let presented = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim);
        match presented {
            None => BearerOutcome::Absent,
            Some(token) if token == expected => BearerOutcome::Verified,
            Some(_) => BearerOutcome::Mismatch,
        }
    }
}

/// Middleware that records the [`BearerOutcome`] as a request extension.
pub async fn bearer_observer(
    State(auth): State<AuthConfig>,
    mut request: Request,
    next: Next,
) -> Response {
    let outcome = auth.check(request.headers());
    match outcome {
        BearerOutcome::Mismatch => warn!(auth = %outcome, "webhook bearer token mismatch, accepting anyway"),
        _ => debug!(auth = %outcome, "webhook bearer token checked"),
    }
    request.extensions_mut().insert(outcome);
    next.run(request).await
}
