// SPDX-FileCopyrightText: 2026 Leasesign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agreement signature lifecycle for Leasesign.
//!
//! One [`SignaturePipeline`] is shared by every transport (HTTP gateway,
//! one-shot ingest, replay). For each provider event it:
//!
//! 1. records the event in the event log ([`recorder`]),
//! 2. resolves the provider request to an agreement ([`resolver`]),
//! 3. computes the transition ([`machine`]),
//! 4. archives the signed document when one is attached,
//! 5. commits the update with a narrow fallback ([`committer`]),
//! 6. marks the event processed.

pub mod committer;
pub mod machine;
pub mod pipeline;
pub mod recorder;
pub mod resolver;

pub use committer::{CommitPath, UpdateCommitter};
pub use machine::{NoChangeReason, PendingDocument, Transition};
pub use pipeline::{Acknowledgment, Disposition, Outcome, SignaturePipeline};
pub use recorder::{EventRecorder, RecordReceipt};
pub use resolver::{AgreementResolver, Resolution};

/// UTC timestamp in the format written to `updated_at` and acknowledgments.
pub fn now_timestamp() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_is_utc_with_millis() {
        let ts = now_timestamp();
        assert_eq!(ts.len(), 24, "got {ts}");
        assert!(ts.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }
}
