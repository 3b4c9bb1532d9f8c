//! Webhook and health HTTP server
//!
//! Alertmanager delivers watchdogs to `POST /webhook`; `GET /health` exposes the
//! monitor's view for operators and `GET /healthz` is a plain liveness probe.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::WebhookPayload;
use crate::error::{AlertdogError, Result};
use crate::supervisor::{Monitor, MonitorStatus};

/// Overall health reported by `/health`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    /// A watchdog or the webhook feed itself is overdue
    Degraded,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    #[serde(flatten)]
    pub monitor: MonitorStatus,
}

/// Build the router serving webhooks and health probes
pub fn router(monitor: Arc<Monitor>) -> Router {
    Router::new()
        .route("/webhook", post(webhook_handler))
        .route("/health", get(health_handler))
        .route("/healthz", get(liveness_handler))
        .with_state(monitor)
}

/// HTTP server in front of the monitor
pub struct HttpServer {
    monitor: Arc<Monitor>,
    port: u16,
}

impl HttpServer {
    pub fn new(monitor: Arc<Monitor>, port: u16) -> Self {
        Self { monitor, port }
    }

    /// Serve until `shutdown` completes, then drain in-flight requests
    pub async fn run<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = router(Arc::clone(&self.monitor));

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        info!("Listening for webhooks on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| AlertdogError::Internal(format!("HTTP server error: {}", e)))?;

        Ok(())
    }
}

/// Alertmanager webhook receiver
async fn webhook_handler(State(monitor): State<Arc<Monitor>>, body: Bytes) -> impl IntoResponse {
    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Rejecting malformed webhook: {}", e);
            return (StatusCode::BAD_REQUEST, format!("invalid webhook payload: {e}"));
        }
    };

    debug!(alerts = payload.alerts.len(), "Webhook received");
    for alert in &payload.alerts {
        monitor.process_event(alert).await;
    }

    (StatusCode::OK, String::new())
}

async fn health_handler(State(monitor): State<Arc<Monitor>>) -> impl IntoResponse {
    let status = monitor.status().await;
    let health = if status.is_healthy() {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    };

    // Paging covers degraded states; the probe itself stays 200
    Json(HealthResponse {
        status: health,
        monitor: status,
    })
}

async fn liveness_handler() -> impl IntoResponse {
    StatusCode::OK
}
