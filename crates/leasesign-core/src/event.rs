// SPDX-FileCopyrightText: 2026 Leasesign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook event types and provider payload decoding.
//!
//! Decoding never fails: an unparseable body is kept as
//! `{"raw_content": "<text>"}` and every extracted field is optional.

use serde::Serialize;
use serde_json::Value;

/// Signature provider event taxonomy, keyed by the provider's `EventId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    SignRequestReceived,
    SignatoryCompleted,
    RequestCompleted,
    Unrecognized(i64),
}

impl EventKind {
    /// Event kinds the state machine acts on.
    pub const SUPPORTED: [EventKind; 3] = [
        EventKind::SignRequestReceived,
        EventKind::SignatoryCompleted,
        EventKind::RequestCompleted,
    ];

    pub fn from_code(code: i64) -> Self {
        match code {
            1 => EventKind::SignRequestReceived,
            2 => EventKind::SignatoryCompleted,
            3 => EventKind::RequestCompleted,
            other => EventKind::Unrecognized(other),
        }
    }

    pub fn code(self) -> i64 {
        match self {
            EventKind::SignRequestReceived => 1,
            EventKind::SignatoryCompleted => 2,
            EventKind::RequestCompleted => 3,
            EventKind::Unrecognized(code) => code,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EventKind::SignRequestReceived => "SignRequestReceived",
            EventKind::SignatoryCompleted => "SignatoryCompleted",
            EventKind::RequestCompleted => "RequestCompleted",
            EventKind::Unrecognized(_) => "Unrecognized",
        }
    }
}

/// A document attached to a provider event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderDocument {
    pub name: Option<String>,
    /// Base64-encoded document bytes.
    pub content: Option<String>,
}

/// One inbound webhook call, decoded from the provider body.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookEvent {
    pub kind: EventKind,
    pub request_id: Option<String>,
    pub event_type: Option<String>,
    pub actor_name: Option<String>,
    pub actor_email: Option<String>,
    pub subject: Option<String>,
    /// ISO-8601 text as sent by the provider.
    pub event_time: Option<String>,
    pub documents: Vec<ProviderDocument>,
    /// The full original body.
    pub raw_payload: Value,
}

impl WebhookEvent {
    /// Decode a raw HTTP body.
    pub fn from_body(body: &[u8]) -> Self {
        let raw = match serde_json::from_slice::<Value>(body) {
            Ok(value) => value,
            Err(_) => serde_json::json!({
                "raw_content": String::from_utf8_lossy(body),
            }),
        };
        Self::from_value(raw)
    }

    /// Decode an already-parsed body (also used when replaying stored events).
    pub fn from_value(raw: Value) -> Self {
        let kind = raw
            .get("EventId")
            .and_then(integer_field)
            .map(EventKind::from_code)
            .unwrap_or(EventKind::Unrecognized(0));

        let documents = raw
            .get("Documents")
            .and_then(Value::as_array)
            .map(|docs| {
                docs.iter()
                    .map(|doc| ProviderDocument {
                        name: text_field(doc, "DocumentName"),
                        content: text_field(doc, "DocumentContent"),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            kind,
            request_id: text_field(&raw, "RequestId"),
            event_type: text_field(&raw, "EventDescription"),
            actor_name: text_field(&raw, "UserName"),
            actor_email: text_field(&raw, "Email"),
            subject: text_field(&raw, "Subject"),
            event_time: text_field(&raw, "EventTime"),
            documents,
            raw_payload: raw,
        }
    }

    /// Content of the first attached document, if any.
    pub fn first_document_content(&self) -> Option<&str> {
        self.documents.first().and_then(|d| d.content.as_deref())
    }
}

/// A webhook event as read back from the event log.
#[derive(Debug, Clone)]
pub struct StoredEvent {
    pub id: String,
    pub received_at: String,
    /// `None` when the deployed schema has no `processed` column.
    pub processed: Option<bool>,
    pub event: WebhookEvent,
}

fn text_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn integer_field(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_kind_codes() {
        assert_eq!(EventKind::from_code(1), EventKind::SignRequestReceived);
        assert_eq!(EventKind::from_code(2), EventKind::SignatoryCompleted);
        assert_eq!(EventKind::from_code(3), EventKind::RequestCompleted);
        assert_eq!(EventKind::from_code(7), EventKind::Unrecognized(7));
        for kind in EventKind::SUPPORTED {
            assert_eq!(EventKind::from_code(kind.code()), kind);
        }
    }

    #[test]
    fn decodes_full_provider_payload() {
        let body = br#"{
            "RequestId": "r1",
            "EventId": 3,
            "EventDescription": "RequestCompleted",
            "UserName": "Jane",
            "Email": "jane@example.com",
            "Subject": "Lease",
            "EventTime": "2024-01-01T00:00:00Z",
            "Documents": [{"DocumentName": "lease.pdf", "DocumentContent": "JVBERi0="}]
        }"#;
        let event = WebhookEvent::from_body(body);
        assert_eq!(event.kind, EventKind::RequestCompleted);
        assert_eq!(event.request_id.as_deref(), Some("r1"));
        assert_eq!(event.actor_email.as_deref(), Some("jane@example.com"));
        assert_eq!(event.event_time.as_deref(), Some("2024-01-01T00:00:00Z"));
        assert_eq!(event.documents.len(), 1);
        assert_eq!(event.first_document_content(), Some("JVBERi0="));
        assert_eq!(event.raw_payload["Subject"], "Lease");
    }

    #[test]
    fn event_id_may_be_numeric_string() {
        let event = WebhookEvent::from_body(br#"{"RequestId":"r1","EventId":"2"}"#);
        assert_eq!(event.kind, EventKind::SignatoryCompleted);
    }

    #[test]
    fn numeric_request_id_is_stringified() {
        let event = WebhookEvent::from_body(br#"{"RequestId":42,"EventId":1}"#);
        assert_eq!(event.request_id.as_deref(), Some("42"));
    }

    #[test]
    fn unparseable_body_is_kept_as_raw_content() {
        let event = WebhookEvent::from_body(b"EventId=1&RequestId=r1");
        assert_eq!(event.kind, EventKind::Unrecognized(0));
        assert!(event.request_id.is_none());
        assert_eq!(event.raw_payload["raw_content"], "EventId=1&RequestId=r1");
    }

    #[test]
    fn missing_event_id_is_unrecognized() {
        let event = WebhookEvent::from_body(br#"{"RequestId":"r1"}"#);
        assert_eq!(event.kind, EventKind::Unrecognized(0));
    }

    #[test]
    fn blank_strings_are_absent() {
        let event = WebhookEvent::from_body(br#"{"RequestId":"  ","EventId":2,"Email":""}"#);
        assert!(event.request_id.is_none());
        assert!(event.actor_email.is_none());
    }
}
