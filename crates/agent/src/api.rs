//! HTTP API for the agent's own health checks and Prometheus metrics

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use dockwatch_lib::{health::ComponentStatus, HealthRegistry};
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub health_registry: HealthRegistry,
}

impl AppState {
    pub fn new(health_registry: HealthRegistry) -> Self {
        Self { health_registry }
    }
}

/// 200 while healthy or degraded, 503 once a component is unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return (StatusCode::INTERNAL_SERVER_ERROR, Vec::new()).into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use dockwatch_lib::health::components;
    use dockwatch_lib::AgentMetrics;
    use tower::ServiceExt;

    async fn setup_test_app() -> (Router, Arc<AppState>) {
        let health_registry = HealthRegistry::new();
        health_registry.register(components::RUNTIME).await;
        health_registry.register(components::COLLECTOR).await;
        health_registry.register(components::SINK).await;

        let state = Arc::new(AppState::new(health_registry));
        (create_router(state.clone()), state)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_healthz_ok_when_healthy() {
        let (app, _state) = setup_test_app().await;

        let (status, health) = get_json(app, "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(health["status"], "healthy");
    }

    #[tokio::test]
    async fn test_healthz_ok_when_sink_degraded() {
        let (app, state) = setup_test_app().await;
        state
            .health_registry
            .set_degraded(components::SINK, "endpoint returned 500")
            .await;

        let (status, health) = get_json(app, "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(health["status"], "degraded");
        assert_eq!(health["components"]["sink"]["message"], "endpoint returned 500");
    }

    #[tokio::test]
    async fn test_healthz_503_when_unhealthy() {
        let (app, state) = setup_test_app().await;
        state
            .health_registry
            .set_unhealthy(components::RUNTIME, "docker socket unavailable")
            .await;

        let (status, health) = get_json(app, "/healthz").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(health["status"], "unhealthy");
    }

    #[tokio::test]
    async fn test_readyz_follows_loop_state() {
        let (app, state) = setup_test_app().await;

        let (status, readiness) = get_json(app.clone(), "/readyz").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(readiness["ready"], false);

        state.health_registry.set_ready(true).await;
        let (status, readiness) = get_json(app, "/readyz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(readiness["ready"], true);
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let (app, _state) = setup_test_app().await;
        AgentMetrics::new().inc_cycles();

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("dockwatch_poll_cycles_total"));
    }
}
