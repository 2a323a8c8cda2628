// SPDX-FileCopyrightText: 2026 Leasesign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agreement reads and partial updates.

use std::str::FromStr;

use leasesign_core::types::{decode_signatories, encode_signatories};
use leasesign_core::{Agreement, AgreementStatus, AgreementUpdate, LeasesignError, SignatureStatus, Signatory};
use rusqlite::types::{ToSql, Type};
use rusqlite::{OptionalExtension, Row, params};

use crate::database::{Database, classify_write_error};

const TABLE: &str = "agreements";

const AGREEMENT_COLUMNS: &str = "id, property_id, rentee_id, eviasignreference, status, \
     signature_status, signatories_status, signed_document_url, signed_date, created_at, updated_at";

fn agreement_from_row(row: &Row<'_>) -> rusqlite::Result<Agreement> {
    let status: String = row.get(4)?;
    let status = AgreementStatus::from_str(&status)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;
    let signature_status: Option<String> = row.get(5)?;
    let signatories: Option<String> = row.get(6)?;

    Ok(Agreement {
        id: row.get(0)?,
        property_id: row.get(1)?,
        rentee_id: row.get(2)?,
        external_reference: row.get(3)?,
        status,
        signature_status: signature_status.map(|raw| {
            let Ok(parsed) = raw.parse::<SignatureStatus>();
            parsed
        }),
        signatories: decode_signatories(signatories.as_deref()),
        signed_document_url: row.get(7)?,
        signed_date: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

/// Insert an agreement row. Used to seed records; creation is owned elsewhere.
pub async fn insert_agreement(db: &Database, agreement: &Agreement) -> Result<(), LeasesignError> {
    let agreement = agreement.clone();
    db.connection()
        .call(move |conn| {
            let result = conn.execute(
                "INSERT INTO agreements (id, property_id, rentee_id, eviasignreference, status,
                     signature_status, signatories_status, signed_document_url, signed_date,
                     created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    agreement.id,
                    agreement.property_id,
                    agreement.rentee_id,
                    agreement.external_reference,
                    agreement.status.to_string(),
                    agreement.signature_status.as_ref().map(|s| s.to_string()),
                    encode_signatories(&agreement.signatories),
                    agreement.signed_document_url,
                    agreement.signed_date,
                    agreement.created_at,
                    agreement.updated_at,
                ],
            );
            match result {
                Ok(_) => Ok(Ok(())),
                Err(e) => match classify_write_error(TABLE, &e) {
                    Some(classified) => Ok(Err(classified)),
                    None => Err(e),
                },
            }
        })
        .await
        .map_err(crate::database::map_tr_err)?
}

/// Get an agreement by its id.
pub async fn get_agreement(db: &Database, id: &str) -> Result<Option<Agreement>, LeasesignError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {AGREEMENT_COLUMNS} FROM agreements WHERE id = ?1"),
                params![id],
                agreement_from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Exact-match lookup on the provider reference (`eviasignreference`).
///
/// When several rows share a reference the most recently created one wins.
pub async fn find_by_reference(
    db: &Database,
    reference: &str,
) -> Result<Option<Agreement>, LeasesignError> {
    let reference = reference.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {AGREEMENT_COLUMNS} FROM agreements
                     WHERE eviasignreference = ?1
                     ORDER BY created_at DESC LIMIT 1"
                ),
                params![reference],
                agreement_from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Read the current signatory list of an agreement.
pub async fn get_signatories(db: &Database, id: &str) -> Result<Vec<Signatory>, LeasesignError> {
    let key = id.to_string();
    let raw = db
        .connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT signatories_status FROM agreements WHERE id = ?1",
                params![key],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    match raw {
        Some(raw) => Ok(decode_signatories(raw.as_deref())),
        None => Err(LeasesignError::NotFound {
            entity: "agreement".to_string(),
            key: id.to_string(),
        }),
    }
}

/// Apply a partial update. Only the fields present in `update` are written;
/// `updated_at` is always set.
pub async fn update_agreement(
    db: &Database,
    id: &str,
    update: &AgreementUpdate,
    updated_at: &str,
) -> Result<(), LeasesignError> {
    let mut assignments: Vec<&'static str> = Vec::new();
    let mut values: Vec<Box<dyn ToSql + Send>> = Vec::new();

    if let Some(status) = update.status {
        assignments.push("status");
        values.push(Box::new(status.to_string()));
    }
    if let Some(signature_status) = &update.signature_status {
        assignments.push("signature_status");
        values.push(Box::new(signature_status.to_string()));
    }
    if let Some(signatories) = &update.signatories {
        assignments.push("signatories_status");
        values.push(Box::new(encode_signatories(signatories)));
    }
    if let Some(url) = &update.signed_document_url {
        assignments.push("signed_document_url");
        values.push(Box::new(url.clone()));
    }
    if let Some(date) = &update.signed_date {
        assignments.push("signed_date");
        values.push(Box::new(date.clone()));
    }
    assignments.push("updated_at");
    values.push(Box::new(updated_at.to_string()));

    let set_clause = assignments
        .iter()
        .enumerate()
        .map(|(i, column)| format!("{column} = ?{}", i + 1))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "UPDATE agreements SET {set_clause} WHERE id = ?{}",
        values.len() + 1
    );
    values.push(Box::new(id.to_string()));

    execute_keyed_update(db, id, sql, values).await
}

/// Narrow administrative write: only `signature_status`, optionally the
/// coarse `status`, and `updated_at`.
pub async fn force_signature_status(
    db: &Database,
    id: &str,
    signature_status: &SignatureStatus,
    status: Option<AgreementStatus>,
    updated_at: &str,
) -> Result<(), LeasesignError> {
    let (sql, values): (&str, Vec<Box<dyn ToSql + Send>>) = match status {
        Some(status) => (
            "UPDATE agreements SET signature_status = ?1, status = ?2, updated_at = ?3 WHERE id = ?4",
            vec![
                Box::new(signature_status.to_string()),
                Box::new(status.to_string()),
                Box::new(updated_at.to_string()),
                Box::new(id.to_string()),
            ],
        ),
        None => (
            "UPDATE agreements SET signature_status = ?1, updated_at = ?2 WHERE id = ?3",
            vec![
                Box::new(signature_status.to_string()),
                Box::new(updated_at.to_string()),
                Box::new(id.to_string()),
            ],
        ),
    };

    execute_keyed_update(db, id, sql.to_string(), values).await
}

/// Run an UPDATE keyed by agreement id, classifying schema rejections and
/// mapping zero affected rows to `NotFound`.
async fn execute_keyed_update(
    db: &Database,
    id: &str,
    sql: String,
    values: Vec<Box<dyn ToSql + Send>>,
) -> Result<(), LeasesignError> {
    let changed = db
        .connection()
        .call(move |conn| {
            let params: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref() as &dyn ToSql).collect();
            match conn.execute(&sql, params.as_slice()) {
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
            entity: "agreement".to_string(),
            key: id.to_string(),
        });
    }
    Ok(())
}
