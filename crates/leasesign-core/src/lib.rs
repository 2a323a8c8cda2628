// SPDX-FileCopyrightText: 2026 Leasesign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Leasesign agreement signature service.
//!
//! This crate provides the collaborator traits, the error type, and the
//! agreement and webhook event types used throughout the workspace.

pub mod error;
pub mod event;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::LeasesignError;
pub use event::{EventKind, ProviderDocument, StoredEvent, WebhookEvent};
pub use types::{
    AdapterType, Agreement, AgreementStatus, AgreementUpdate, HealthStatus, SignatoryState,
    Signatory, SignatureStatus,
};

pub use traits::{AgreementStore, EventLog, ObjectStore, PluginAdapter};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_rejections_are_classified() {
        let missing = LeasesignError::UnsupportedField {
            table: "webhook_events".into(),
            field: "processed".into(),
        };
        let constraint = LeasesignError::ConstraintViolation {
            table: "agreements".into(),
            detail: "CHECK constraint failed".into(),
        };
        let storage = LeasesignError::Storage {
            source: Box::new(std::io::Error::other("disk full")),
        };
        assert!(missing.is_schema_rejection());
        assert!(constraint.is_schema_rejection());
        assert!(!storage.is_schema_rejection());
        assert_eq!(
            missing.to_string(),
            "unsupported field `processed` on table `webhook_events`"
        );
    }

    #[test]
    fn adapter_type_round_trips() {
        use std::str::FromStr;

        for variant in [AdapterType::Storage, AdapterType::ObjectStore] {
            let parsed = AdapterType::from_str(&variant.to_string()).expect("should parse back");
            assert_eq!(variant, parsed);
        }
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_agreement_store<T: AgreementStore>() {}
        fn _assert_event_log<T: EventLog>() {}
        fn _assert_object_store<T: ObjectStore>() {}
    }
}
