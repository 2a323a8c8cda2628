// SPDX-FileCopyrightText: 2026 Leasesign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot subcommands: `ingest`, `replay`, `events`, `check-config`.

use std::path::PathBuf;

use leasesign_config::LeasesignConfig;
use leasesign_core::{LeasesignError, WebhookEvent};
use leasesign_signature::{Acknowledgment, Disposition};
use tokio::io::AsyncReadExt;
use tracing::info;

use crate::serve::Services;

/// Process a single payload the way a function host would and print the
/// acknowledgment as JSON.
pub async fn run_ingest(
    config: LeasesignConfig,
    file: Option<PathBuf>,
) -> Result<(), LeasesignError> {
    let body = match &file {
        Some(path) => tokio::fs::read(path).await.map_err(|e| {
            LeasesignError::Payload(format!("cannot read {}: {e}", path.display()))
        })?,
        None => {
            let mut buf = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut buf)
                .await
                .map_err(|e| LeasesignError::Payload(format!("cannot read stdin: {e}")))?;
            buf
        }
    };

    let services = Services::build(&config).await?;
    let event = WebhookEvent::from_body(&body);
    let outcome = services.pipeline.handle(&event).await;
    services.shutdown().await;

    print_json(&Acknowledgment::from(&outcome))
}

/// Re-run every stored event of one provider request, oldest first.
pub async fn run_replay(
    config: LeasesignConfig,
    request_id: &str,
    limit: usize,
) -> Result<(), LeasesignError> {
    let services = Services::build(&config).await?;
    let stored = services
        .pipeline
        .recorder()
        .list(Some(request_id), limit)
        .await?;
    info!(request_id, count = stored.len(), "replaying stored events");

    let mut failures = 0usize;
    for event in &stored {
        let outcome = services.pipeline.reprocess(event).await;
        if outcome.disposition.is_failure() {
            failures += 1;
        }
        println!(
            "{}  {:<20}  {}",
            event.id,
            event.event.kind.name(),
            describe(&outcome.disposition)
        );
    }
    services.shutdown().await;

    if failures > 0 {
        return Err(LeasesignError::Internal(format!(
            "{failures} of {} replayed events failed",
            stored.len()
        )));
    }
    Ok(())
}

/// Print stored events as one line each.
pub async fn run_events(
    config: LeasesignConfig,
    request_id: Option<&str>,
    limit: usize,
) -> Result<(), LeasesignError> {
    let services = Services::build(&config).await?;
    let stored = services.pipeline.recorder().list(request_id, limit).await?;
    services.shutdown().await;

    if stored.is_empty() {
        println!("no webhook events recorded");
        return Ok(());
    }
    for event in stored {
        let processed = match event.processed {
            Some(true) => "processed",
            Some(false) => "pending",
            None => "-",
        };
        println!(
            "{}  {}  {:<10}  {:<20}  {:<9}  {}",
            event.received_at,
            event.id,
            event.event.request_id.as_deref().unwrap_or("-"),
            event.event.kind.name(),
            processed,
            event.event.actor_email.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

pub fn print_config_summary(config: &LeasesignConfig) {
    println!("configuration OK");
    println!(
        "  gateway:   {}:{}{}",
        config.gateway.host, config.gateway.port, config.gateway.webhook_path
    );
    println!("  database:  {}", config.storage.database_path);
    println!(
        "  documents: {:?} bucket={} prefix={}",
        config.documents.backend, config.documents.bucket, config.documents.path_prefix
    );
}

fn describe(disposition: &Disposition) -> String {
    match disposition {
        Disposition::Applied {
            agreement_id, path, ..
        } => format!("applied to {agreement_id} ({path})"),
        Disposition::Unchanged {
            agreement_id,
            reason,
        } => format!("unchanged {agreement_id}: {reason}"),
        Disposition::AgreementNotFound { .. } => "no matching agreement".to_string(),
        Disposition::Ignored { event_id } => format!("ignored event id {event_id}"),
        Disposition::Failed { error } => format!("failed: {error}"),
    }
}

fn print_json(ack: &Acknowledgment) -> Result<(), LeasesignError> {
    let json = serde_json::to_string_pretty(ack)
        .map_err(|e| LeasesignError::Internal(format!("cannot encode acknowledgment: {e}")))?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use leasesign_signature::{CommitPath, NoChangeReason};

    #[test]
    fn dispositions_describe_themselves() {
        assert_eq!(
            describe(&Disposition::Applied {
                agreement_id: "ag-1".into(),
                path: CommitPath::Fallback,
                document_url: None,
            }),
            "applied to ag-1 (fallback)"
        );
        assert_eq!(
            describe(&Disposition::Unchanged {
                agreement_id: "ag-1".into(),
                reason: NoChangeReason::UnrecognizedEvent(9),
            }),
            "unchanged ag-1: unrecognized event id 9"
        );
        assert_eq!(
            describe(&Disposition::Ignored { event_id: 0 }),
            "ignored event id 0"
        );
    }

    fn temp_config(dir: &std::path::Path) -> LeasesignConfig {
        let mut config = LeasesignConfig::default();
        config.storage.database_path = dir.join("leasesign.db").display().to_string();
        config.documents.local_dir = dir.join("documents").display().to_string();
        config
    }

    #[tokio::test]
    async fn ingest_file_then_list_and_replay() {
        let dir = tempfile::tempdir().unwrap();
        let payload = dir.path().join("event.json");
        std::fs::write(
            &payload,
            leasesign_test_utils::payloads::body(
                &leasesign_test_utils::payloads::sign_request_received("r1", "T1"),
            ),
        )
        .unwrap();

        run_ingest(temp_config(dir.path()), Some(payload))
            .await
            .unwrap();
        run_events(temp_config(dir.path()), Some("r1"), 10)
            .await
            .unwrap();
        run_replay(temp_config(dir.path()), "r1", 10).await.unwrap();

        let services = Services::build(&temp_config(dir.path())).await.unwrap();
        let stored = services.pipeline.recorder().list(None, 10).await.unwrap();
        assert_eq!(stored.len(), 1, "replay must not record again");
        services.shutdown().await;
    }

    #[tokio::test]
    async fn ingest_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_ingest(temp_config(dir.path()), Some(dir.path().join("nope.json")))
            .await
            .unwrap_err();
        assert!(matches!(err, LeasesignError::Payload(_)));
    }
}
