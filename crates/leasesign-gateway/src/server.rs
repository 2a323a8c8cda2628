// SPDX-FileCopyrightText: 2026 Leasesign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::path::PathBuf;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};
use leasesign_core::LeasesignError;
use leasesign_signature::SignaturePipeline;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer, cors::CorsLayer, services::ServeDir, trace::TraceLayer,
};

use crate::auth::{AuthConfig, bearer_observer};
use crate::handlers;

/// State for the unauthenticated health endpoint.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub pipeline: SignaturePipeline,
    pub auth: AuthConfig,
    pub health: HealthState,
    /// Name reported by the capability descriptor.
    pub service_name: String,
    pub webhook_path: String,
}

/// Gateway server configuration (mirrors `GatewayConfig` from leasesign-config).
#[derive(Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub webhook_path: String,
    pub bearer_token: Option<String>,
    /// Directory served read-only under `/documents` (local document backend).
    pub documents_dir: Option<PathBuf>,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("webhook_path", &self.webhook_path)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "[redacted]"))
            .field("documents_dir", &self.documents_dir)
            .finish()
    }
}

/// Build the gateway router:
/// - `POST <webhook_path>` provider callbacks (bearer token observed, never enforced)
/// - `GET <webhook_path>` capability descriptor
/// - `GET /health`
/// - `GET /documents/*` archived PDFs, when a documents directory is set
pub fn build_router(config: &ServerConfig, state: GatewayState) -> Router {
    let webhook_routes = Router::new()
        .route(
            &config.webhook_path,
            post(handlers::receive_webhook).get(handlers::describe_webhook),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.auth.clone(),
            bearer_observer,
        ))
        .layer(DefaultBodyLimit::disable())
        .layer(CatchPanicLayer::custom(handlers::panic_acknowledgment))
        .with_state(state.clone());

    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .with_state(state);

    let mut app = Router::new().merge(webhook_routes).merge(public_routes);
    if let Some(dir) = &config.documents_dir {
        app = app.nest_service("/documents", ServeDir::new(dir));
    }

    app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    )
}

/// Bind and serve until `shutdown` is cancelled.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), LeasesignError> {
    let app = build_router(config, state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| LeasesignError::Gateway {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!(addr = %addr, webhook_path = %config.webhook_path, "gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| LeasesignError::Gateway {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("gateway stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use leasesign_archive::DocumentArchiver;
    use leasesign_core::AgreementStatus;
    use leasesign_test_utils::payloads;
    use leasesign_test_utils::{MemoryAgreementStore, MemoryEventLog, MemoryObjectStore};
    use tower::ServiceExt;

    struct Fixture {
        agreements: Arc<MemoryAgreementStore>,
        events: Arc<MemoryEventLog>,
        objects: Arc<MemoryObjectStore>,
        router: Router,
    }

    async fn fixture(bearer_token: Option<&str>) -> Fixture {
        let agreements = Arc::new(MemoryAgreementStore::new());
        agreements
            .insert(payloads::agreement("ag-1", "req-1", AgreementStatus::Draft))
            .await;
        let events = Arc::new(MemoryEventLog::new());
        let objects = Arc::new(MemoryObjectStore::new());
        let pipeline = SignaturePipeline::new(
            agreements.clone(),
            events.clone(),
            DocumentArchiver::new(objects.clone(), "signed"),
        );
        let config = ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
            webhook_path: "/webhooks/esign".into(),
            bearer_token: bearer_token.map(Into::into),
            documents_dir: None,
        };
        let state = GatewayState {
            pipeline,
            auth: AuthConfig {
                bearer_token: config.bearer_token.clone(),
            },
            health: HealthState {
                start_time: std::time::Instant::now(),
            },
            service_name: "leasesign".into(),
            webhook_path: config.webhook_path.clone(),
        };
        Fixture {
            agreements,
            events,
            objects,
            router: build_router(&config, state),
        }
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post(body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/webhooks/esign")
            .header("content-type", "application/json")
            .body(body.into())
            .unwrap()
    }

    #[tokio::test]
    async fn post_processes_event_and_acks() {
        let f = fixture(None).await;
        let body = payloads::body(&payloads::sign_request_received("req-1", "T1"));

        let response = f.router.oneshot(post(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["success"], true);
        assert!(json["event_record_id"].is_string());
        assert!(json["timestamp"].is_string());

        assert_eq!(
            f.agreements.get("ag-1").await.unwrap().status,
            AgreementStatus::PendingSignature
        );
        assert_eq!(f.events.events().await.len(), 1);
    }

    #[tokio::test]
    async fn non_json_body_is_still_200() {
        let f = fixture(None).await;
        let request = Request::builder()
            .method("POST")
            .uri("/webhooks/esign")
            .header("content-type", "text/plain")
            .body(Body::from("hello provider"))
            .unwrap();
        let response = f.router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["success"], true);
        assert_eq!(
            f.events.events().await[0].event.raw_payload["raw_content"],
            "hello provider"
        );
    }

    #[tokio::test]
    async fn failure_is_200_with_success_false() {
        let f = fixture(None).await;
        f.agreements.fail_lookups(true);
        let body = payloads::body(&payloads::sign_request_received("req-1", "T1"));
        let response = f.router.oneshot(post(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["success"], false);
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn bearer_mismatch_is_not_rejected() {
        let f = fixture(Some("expected")).await;
        let request = Request::builder()
            .method("POST")
            .uri("/webhooks/esign")
            .header("authorization", "Bearer wrong")
            .body(Body::from(payloads::body(&payloads::sign_request_received(
                "req-1", "T1",
            ))))
            .unwrap();
        let response = f.router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["success"], true);
    }

    #[tokio::test]
    async fn get_returns_capability_descriptor() {
        let f = fixture(Some("expected")).await;
        let request = Request::builder()
            .uri("/webhooks/esign")
            .body(Body::empty())
            .unwrap();
        let response = f.router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["service"], "leasesign");
        assert_eq!(json["status"], "active");
        assert_eq!(json["webhook_path"], "/webhooks/esign");
        let events = json["supported_events"].as_array().unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[2]["id"], 3);
        assert_eq!(events[2]["name"], "RequestCompleted");
        assert!(f.events.events().await.is_empty());
    }

    #[tokio::test]
    async fn health_reports_adapters() {
        let f = fixture(None).await;
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = f.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["adapters"]["storage"]["adapter"], "memory-agreements");

        f.objects.fail_uploads(true);
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = f.router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json_body(response).await["adapters"]["documents"]["status"], "unhealthy");
    }

    #[tokio::test]
    async fn documents_are_served_from_local_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("agreements/signed/ag-1")).unwrap();
        std::fs::write(dir.path().join("agreements/signed/ag-1/a.pdf"), b"%PDF-1.4").unwrap();

        let f = fixture(None).await;
        let config = ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
            webhook_path: "/webhooks/esign".into(),
            bearer_token: None,
            documents_dir: Some(dir.path().to_path_buf()),
        };
        let state = GatewayState {
            pipeline: SignaturePipeline::new(
                f.agreements.clone(),
                f.events.clone(),
                DocumentArchiver::new(f.objects.clone(), "signed"),
            ),
            auth: AuthConfig::default(),
            health: HealthState {
                start_time: std::time::Instant::now(),
            },
            service_name: "leasesign".into(),
            webhook_path: "/webhooks/esign".into(),
        };
        let router = build_router(&config, state);

        let request = Request::builder()
            .uri("/documents/agreements/signed/ag-1/a.pdf")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"%PDF-1.4");
    }

    #[test]
    fn server_config_debug_redacts_token() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8787,
            webhook_path: "/webhooks/esign".into(),
            bearer_token: Some("secret".into()),
            documents_dir: None,
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("127.0.0.1"));
        assert!(!debug.contains("secret"));
    }
}
