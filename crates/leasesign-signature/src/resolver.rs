// SPDX-FileCopyrightText: 2026 Leasesign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Maps a provider request id to the agreement it belongs to.

use std::sync::Arc;

use leasesign_core::{Agreement, AgreementStore, LeasesignError};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Found(Agreement),
    NotFound,
}

/// Exact-match lookup on the agreement's external reference.
#[derive(Clone)]
pub struct AgreementResolver {
    store: Arc<dyn AgreementStore>,
}

impl AgreementResolver {
    pub fn new(store: Arc<dyn AgreementStore>) -> Self {
        Self { store }
    }

    /// A miss is not an error. Storage failures are returned to the caller.
    pub async fn resolve(&self, request_id: &str) -> Result<Resolution, LeasesignError> {
        match self.store.find_by_reference(request_id).await? {
            Some(agreement) => {
                debug!(request_id, agreement_id = %agreement.id, status = %agreement.status, "resolved agreement");
                Ok(Resolution::Found(agreement))
            }
            None => {
                info!(request_id, "no agreement linked to signature request");
                Ok(Resolution::NotFound)
            }
        }
    }
}
