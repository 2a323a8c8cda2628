// SPDX-FileCopyrightText: 2026 Leasesign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers.
//!
//! Handles `POST <webhook_path>`, `GET <webhook_path>` and `GET /health`.

use std::any::Any;

use axum::{
    Extension, Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::{error, info};

use leasesign_core::{EventKind, HealthStatus, WebhookEvent};
use leasesign_signature::{Acknowledgment, now_timestamp};

use crate::auth::BearerOutcome;
use crate::server::GatewayState;

/// One entry of the capability descriptor.
#[derive(Debug, Serialize)]
pub struct SupportedEvent {
    pub id: i64,
    pub name: &'static str,
}

/// Response body for `GET <webhook_path>`.
#[derive(Debug, Serialize)]
pub struct WebhookDescriptor {
    pub service: String,
    pub status: &'static str,
    pub webhook_path: String,
    pub supported_events: Vec<SupportedEvent>,
    pub timestamp: String,
}

/// Health of one collaborator.
#[derive(Debug, Serialize)]
pub struct AdapterHealth {
    pub adapter: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Response body for `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: String,
    pub uptime_secs: u64,
    pub adapters: AdaptersHealth,
}

#[derive(Debug, Serialize)]
pub struct AdaptersHealth {
    pub storage: AdapterHealth,
    pub documents: AdapterHealth,
}

/// POST <webhook_path>
///
/// The body is taken as raw bytes so no extractor can reject it. The reply
/// is always 200; failures are reported as `success: false`.
pub async fn receive_webhook(
    State(state): State<GatewayState>,
    auth: Option<Extension<BearerOutcome>>,
    body: Bytes,
) -> Json<Acknowledgment> {
    let event = WebhookEvent::from_body(&body);
    let auth = auth.map_or(BearerOutcome::NotConfigured, |Extension(outcome)| outcome);
    info!(
        request_id = event.request_id.as_deref().unwrap_or("-"),
        event_id = event.kind.code(),
        event_type = event.event_type.as_deref().unwrap_or("-"),
        bytes = body.len(),
        auth = %auth,
        "webhook received"
    );

    let outcome = state.pipeline.handle(&event).await;
    Json(Acknowledgment::from(&outcome))
}

/// GET <webhook_path>
///
/// Static capability descriptor, unauthenticated.
pub async fn describe_webhook(State(state): State<GatewayState>) -> Json<WebhookDescriptor> {
    Json(WebhookDescriptor {
        service: state.service_name.clone(),
        status: "active",
        webhook_path: state.webhook_path.clone(),
        supported_events: EventKind::SUPPORTED
            .iter()
            .map(|kind| SupportedEvent {
                id: kind.code(),
                name: kind.name(),
            })
            .collect(),
        timestamp: now_timestamp(),
    })
}

/// GET /health
///
/// 503 when any collaborator is unhealthy.
pub async fn get_health(State(state): State<GatewayState>) -> Response {
    let agreements = state.pipeline.agreements();
    let documents = state.pipeline.archiver().store();

    let storage = adapter_health(agreements.name(), agreements.health_check().await);
    let documents = adapter_health(documents.name(), documents.health_check().await);

    let overall = match (storage.status, documents.status) {
        ("unhealthy", _) | (_, "unhealthy") => "unhealthy",
        ("degraded", _) | (_, "degraded") => "degraded",
        _ => "ok",
    };
    let code = if overall == "unhealthy" {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    let body = HealthResponse {
        status: overall,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
        adapters: AdaptersHealth { storage, documents },
    };
    (code, Json(body)).into_response()
}

fn adapter_health(
    name: &str,
    result: Result<HealthStatus, leasesign_core::LeasesignError>,
) -> AdapterHealth {
    let (status, detail) = match result {
        Ok(HealthStatus::Healthy) => ("healthy", None),
        Ok(HealthStatus::Degraded(msg)) => ("degraded", Some(msg)),
        Ok(HealthStatus::Unhealthy(msg)) => ("unhealthy", Some(msg)),
        Err(e) => ("unhealthy", Some(e.to_string())),
    };
    AdapterHealth {
        adapter: name.to_string(),
        status,
        detail,
    }
}

/// Converts a panic in the webhook route into the standard acknowledgment.
pub fn panic_acknowledgment(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = detail, "webhook handler panicked");
    (
        StatusCode::OK,
        Json(Acknowledgment::failure("internal error while processing webhook")),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_becomes_success_false_ack() {
        let response = panic_acknowledgment(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn adapter_health_maps_statuses() {
        assert_eq!(adapter_health("a", Ok(HealthStatus::Healthy)).status, "healthy");
        let degraded = adapter_health("a", Ok(HealthStatus::Degraded("slow".into())));
        assert_eq!(degraded.status, "degraded");
        assert_eq!(degraded.detail.as_deref(), Some("slow"));
        let failed = adapter_health(
            "a",
            Err(leasesign_core::LeasesignError::Internal("x".into())),
        );
        assert_eq!(failed.status, "unhealthy");
    }

    #[test]
    fn health_response_omits_empty_detail() {
        let json = serde_json::to_string(&AdapterHealth {
            adapter: "sqlite".into(),
            status: "healthy",
            detail: None,
        })
        .unwrap();
        assert_eq!(json, r#"{"adapter":"sqlite","status":"healthy"}"#);
    }
}
