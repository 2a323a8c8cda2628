// SPDX-FileCopyrightText: 2026 Leasesign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook event log operations.
//!
//! Rows are appended once per inbound call and never deleted. The
//! `processed` column is optional: deployments that lack it surface
//! [`LeasesignError::UnsupportedField`] on writes that name it, and reads
//! report `processed = None`.

use leasesign_core::{LeasesignError, StoredEvent, WebhookEvent};
use rusqlite::{Row, params};

use crate::database::{Database, classify_write_error};

const TABLE: &str = "webhook_events";

/// Timestamp format used for `received_at` and `updated_at` columns.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Append one event row and return its generated id.
pub async fn append_event(
    db: &Database,
    event: &WebhookEvent,
    with_processed: bool,
) -> Result<String, LeasesignError> {
    let id = uuid::Uuid::new_v4().to_string();
    let received_at = chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string();
    let raw_payload = event.raw_payload.to_string();
    let event = event.clone();
    let row_id = id.clone();

    db.connection()
        .call(move |conn| {
            let result = if with_processed {
                conn.execute(
                    "INSERT INTO webhook_events (id, request_id, event_id, event_type, actor_name,
                         actor_email, subject, event_time, raw_payload, received_at, processed)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 0)",
                    params![
                        row_id,
                        event.request_id,
                        event.kind.code(),
                        event.event_type,
                        event.actor_name,
                        event.actor_email,
                        event.subject,
                        event.event_time,
                        raw_payload,
                        received_at,
                    ],
                )
            } else {
                conn.execute(
                    "INSERT INTO webhook_events (id, request_id, event_id, event_type, actor_name,
                         actor_email, subject, event_time, raw_payload, received_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                    params![
                        row_id,
                        event.request_id,
                        event.kind.code(),
                        event.event_type,
                        event.actor_name,
                        event.actor_email,
                        event.subject,
                        event.event_time,
                        raw_payload,
                        received_at,
                    ],
                )
            };
            match result {
                Ok(_) => Ok(Ok(())),
                Err(e) => match classify_write_error(TABLE, &e) {
                    Some(classified) => Ok(Err(classified)),
                    None => Err(e),
                },
            }
        })
        .await
        .map_err(crate::database::map_tr_err)??;

    Ok(id)
}

/// Set `processed = 1` on an event row.
pub async fn mark_processed(db: &Database, id: &str) -> Result<(), LeasesignError> {
    let key = id.to_string();
    let changed = db
        .connection()
        .call(move |conn| {
            match conn.execute(
                "UPDATE webhook_events SET processed = 1 WHERE id = ?1",
                params![key],
            ) {
                Ok(changed) => Ok(Ok(changed)),
                Err(e) => match classify_write_error(TABLE, &e) {
                    Some(classified) => Ok(Err(classified)),
                    None => Err(e),
                },
            }
        })
        .await
        .map_err(crate::database::map_tr_err)??;

    if changed == 0 {
        return Err(LeasesignError::NotFound {
            entity: "webhook event".to_string(),
            key: id.to_string(),
        });
    }
    Ok(())
}

/// List stored events oldest first, optionally filtered by request id.
pub async fn list_events(
    db: &Database,
    request_id: Option<&str>,
    limit: usize,
) -> Result<Vec<StoredEvent>, LeasesignError> {
    let request_id = request_id.map(|s| s.to_string());
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);

    db.connection()
        .call(move |conn| {
            // Deployments without the optional column still list their events.
            let has_processed = conn
                .prepare("SELECT processed FROM webhook_events LIMIT 0")
                .is_ok();
            let processed_column = if has_processed { "processed" } else { "NULL" };
            let sql = format!(
                "SELECT id, received_at, raw_payload, {processed_column}
                 FROM webhook_events
                 WHERE (?1 IS NULL OR request_id = ?1)
                 ORDER BY received_at ASC, rowid ASC
                 LIMIT ?2"
            );

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![request_id, limit], stored_event_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

fn stored_event_from_row(row: &Row<'_>) -> rusqlite::Result<StoredEvent> {
    let raw_payload: String = row.get(2)?;
    let processed: Option<i64> = row.get(3)?;
    Ok(StoredEvent {
        id: row.get(0)?,
        received_at: row.get(1)?,
        processed: processed.map(|flag| flag != 0),
        event: WebhookEvent::from_body(raw_payload.as_bytes()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use leasesign_core::EventKind;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    async fn drop_processed_column(db: &Database) {
        db.connection()
            .call(|conn| {
                conn.execute_batch("ALTER TABLE webhook_events DROP COLUMN processed;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)
            .unwrap();
    }

    fn event(body: &str) -> WebhookEvent {
        WebhookEvent::from_body(body.as_bytes())
    }

    #[tokio::test]
    async fn append_and_list_round_trip() {
        let (db, _dir) = setup_db().await;
        let ev = event(r#"{"RequestId":"r1","EventId":2,"Email":"a@x.com","EventTime":"T2"}"#);

        let id = append_event(&db, &ev, true).await.unwrap();
        assert_eq!(id.len(), 36, "id should be a UUID");

        let listed = list_events(&db, Some("r1"), 10).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);
        assert_eq!(listed[0].processed, Some(false));
        assert_eq!(listed[0].event.kind, EventKind::SignatoryCompleted);
        assert_eq!(listed[0].event.actor_email.as_deref(), Some("a@x.com"));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_deliveries_are_stored_again() {
        let (db, _dir) = setup_db().await;
        let ev = event(r#"{"RequestId":"r1","EventId":1}"#);
        let first = append_event(&db, &ev, true).await.unwrap();
        let second = append_event(&db, &ev, true).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(list_events(&db, Some("r1"), 10).await.unwrap().len(), 2);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn list_filters_and_orders_oldest_first() {
        let (db, _dir) = setup_db().await;
        let a = append_event(&db, &event(r#"{"RequestId":"r1","EventId":1}"#), true)
            .await
            .unwrap();
        append_event(&db, &event(r#"{"RequestId":"r2","EventId":1}"#), true)
            .await
            .unwrap();
        let c = append_event(&db, &event(r#"{"RequestId":"r1","EventId":3}"#), true)
            .await
            .unwrap();

        let r1: Vec<String> = list_events(&db, Some("r1"), 10)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(r1, vec![a.clone(), c]);

        assert_eq!(list_events(&db, None, 10).await.unwrap().len(), 3);
        let limited = list_events(&db, None, 1).await.unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].id, a);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn mark_processed_sets_flag() {
        let (db, _dir) = setup_db().await;
        let id = append_event(&db, &event(r#"{"RequestId":"r1","EventId":1}"#), true)
            .await
            .unwrap();
        mark_processed(&db, &id).await.unwrap();
        let listed = list_events(&db, Some("r1"), 10).await.unwrap();
        assert_eq!(listed[0].processed, Some(true));

        let err = mark_processed(&db, "missing").await.unwrap_err();
        assert!(matches!(err, LeasesignError::NotFound { .. }));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn missing_processed_column_is_reported_as_unsupported_field() {
        let (db, _dir) = setup_db().await;
        drop_processed_column(&db).await;
        let ev = event(r#"{"RequestId":"r1","EventId":1}"#);

        let err = append_event(&db, &ev, true).await.unwrap_err();
        match err {
            LeasesignError::UnsupportedField { table, field } => {
                assert_eq!(table, "webhook_events");
                assert_eq!(field, "processed");
            }
            other => panic!("expected UnsupportedField, got {other:?}"),
        }

        let id = append_event(&db, &ev, false).await.unwrap();
        let err = mark_processed(&db, &id).await.unwrap_err();
        assert!(matches!(err, LeasesignError::UnsupportedField { .. }));

        let listed = list_events(&db, Some("r1"), 10).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].processed, None);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn non_json_payload_is_kept_raw() {
        let (db, _dir) = setup_db().await;
        append_event(&db, &event("not json at all"), true).await.unwrap();
        let listed = list_events(&db, None, 10).await.unwrap();
        assert_eq!(listed[0].event.raw_payload["raw_content"], "not json at all");
        assert!(listed[0].event.request_id.is_none());
        db.close().await.unwrap();
    }
}
