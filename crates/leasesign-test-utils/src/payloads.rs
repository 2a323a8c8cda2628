// SPDX-FileCopyrightText: 2026 Leasesign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider webhook bodies and seed agreements.

use leasesign_core::{Agreement, AgreementStatus};
use serde_json::{Value, json};

/// `%PDF-1.4\n%äüöß` as base64.
pub const SAMPLE_PDF_BASE64: &str = "JVBERi0xLjQKJcOkw7zDtsOf";

/// EventId 1.
pub fn sign_request_received(request_id: &str, event_time: &str) -> Value {
    json!({
        "RequestId": request_id,
        "EventId": 1,
        "EventDescription": "SignRequestReceived",
        "Subject": "Rental agreement",
        "EventTime": event_time,
    })
}

/// EventId 2 for one signer.
pub fn signatory_completed(request_id: &str, name: &str, email: &str, event_time: &str) -> Value {
    json!({
        "RequestId": request_id,
        "EventId": 2,
        "EventDescription": "SignatoryCompleted",
        "UserName": name,
        "Email": email,
        "EventTime": event_time,
    })
}

/// EventId 3, optionally carrying one document.
pub fn request_completed(request_id: &str, event_time: &str, document: Option<&str>) -> Value {
    let documents: Vec<Value> = document
        .map(|content| {
            vec![json!({
                "DocumentName": "rental-agreement.pdf",
                "DocumentContent": content,
            })]
        })
        .unwrap_or_default();
    json!({
        "RequestId": request_id,
        "EventId": 3,
        "EventDescription": "RequestCompleted",
        "EventTime": event_time,
        "Documents": documents,
    })
}

/// Serialize a payload into a request body.
pub fn body(payload: &Value) -> Vec<u8> {
    payload.to_string().into_bytes()
}

/// A seed agreement linked to `reference` with no signatories.
pub fn agreement(id: &str, reference: &str, status: AgreementStatus) -> Agreement {
    Agreement {
        id: id.to_string(),
        property_id: Some("prop-1".to_string()),
        rentee_id: Some("rentee-1".to_string()),
        external_reference: Some(reference.to_string()),
        status,
        signature_status: None,
        signatories: Vec::new(),
        signed_document_url: None,
        signed_date: None,
        created_at: "2026-01-01T00:00:00.000Z".to_string(),
        updated_at: "2026-01-01T00:00:00.000Z".to_string(),
    }
}
