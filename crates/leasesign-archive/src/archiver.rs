// SPDX-FileCopyrightText: 2026 Leasesign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Decodes signed documents and stores them as PDFs.
//!
//! Archiving is best-effort: every failure is logged and reported as `None`
//! so the completed-signature transition proceeds without a document URL.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use leasesign_core::{LeasesignError, ObjectStore};
use tracing::{info, warn};

/// Content type of every archived document.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Stores signed agreement documents through an [`ObjectStore`].
#[derive(Clone)]
pub struct DocumentArchiver {
    store: Arc<dyn ObjectStore>,
    path_prefix: String,
}

impl DocumentArchiver {
    pub fn new(store: Arc<dyn ObjectStore>, path_prefix: &str) -> Self {
        Self {
            store,
            path_prefix: path_prefix.trim_matches('/').to_string(),
        }
    }

    /// The backing object store.
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Decode `content` and upload it for `agreement_id`.
    ///
    /// Returns the public URL of the stored PDF, or `None` when there was
    /// nothing to store or anything went wrong.
    pub async fn archive(&self, content: Option<&str>, agreement_id: &str) -> Option<String> {
        let Some(content) = content else {
            warn!(agreement_id, "completed event carried no document content");
            return None;
        };

        let bytes = match decode_document(content) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(agreement_id, error = %e, "could not decode signed document");
                return None;
            }
        };

        let path = object_path(
            &self.path_prefix,
            agreement_id,
            chrono::Utc::now().timestamp_millis(),
        );
        let size = bytes.len();
        if let Err(e) = self.store.upload(&path, bytes, PDF_CONTENT_TYPE, true).await {
            warn!(agreement_id, path = %path, error = %e, "signed document upload failed");
            return None;
        }

        let url = self.store.public_url(&path);
        info!(agreement_id, path = %path, bytes = size, "signed document archived");
        Some(url)
    }
}

/// Decode plain base64 or a `data:` URL into raw bytes.
///
/// Whitespace (line-wrapped base64) is ignored. An empty result is an error.
pub fn decode_document(content: &str) -> Result<Vec<u8>, LeasesignError> {
    let trimmed = content.trim();
    let payload = match trimmed.strip_prefix("data:") {
        Some(rest) => {
            let (meta, data) = rest.split_once(',').ok_or_else(|| {
                LeasesignError::Payload("data URL has no payload separator".to_string())
            })?;
            if !meta.ends_with(";base64") {
                return Err(LeasesignError::Payload(
                    "data URL is not base64-encoded".to_string(),
                ));
            }
            data
        }
        None => trimmed,
    };

    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| LeasesignError::Payload(format!("invalid base64 document: {e}")))?;
    if bytes.is_empty() {
        return Err(LeasesignError::Payload("document is empty".to_string()));
    }
    Ok(bytes)
}

/// `<prefix>/<agreement_id>/signed-agreement-<unix_millis>.pdf`
pub fn object_path(prefix: &str, agreement_id: &str, unix_millis: i64) -> String {
    let file = format!("{agreement_id}/signed-agreement-{unix_millis}.pdf");
    if prefix.is_empty() {
        file
    } else {
        format!("{prefix}/{file}")
    }
}
