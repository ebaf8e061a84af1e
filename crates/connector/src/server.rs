use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::net::TcpListener;

use crate::metrics::encode_metrics;

/// Default staleness threshold: no upstream activity for this long fails readiness
pub const DEFAULT_STALE_THRESHOLD_SECS: u64 = 300;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub feed: String,
    pub connected: bool,
    pub stale: bool,
    pub idle_secs: Option<u64>,
}

/// Shared state for health endpoints
#[derive(Clone)]
pub struct ServerState {
    pub feed_name: String,
    pub connected: Arc<AtomicBool>,
    /// Last upstream activity (epoch seconds, 0 = never)
    pub last_activity: Arc<AtomicU64>,
    pub stale_threshold_secs: u64,
}

impl ServerState {
    pub fn new(
        feed_name: impl Into<String>,
        connected: Arc<AtomicBool>,
        last_activity: Arc<AtomicU64>,
    ) -> Self {
        Self {
            feed_name: feed_name.into(),
            connected,
            last_activity,
            stale_threshold_secs: DEFAULT_STALE_THRESHOLD_SECS,
        }
    }

    pub fn with_stale_threshold(mut self, secs: u64) -> Self {
        self.stale_threshold_secs = secs;
        self
    }

    fn idle_secs(&self) -> Option<u64> {
        let last = self.last_activity.load(Ordering::SeqCst);
        if last == 0 {
            return None;
        }
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Some(now.saturating_sub(last))
    }

    fn snapshot(&self, status: &str) -> HealthResponse {
        let idle_secs = self.idle_secs();
        HealthResponse {
            status: status.to_string(),
            feed: self.feed_name.clone(),
            connected: self.connected.load(Ordering::SeqCst),
            stale: idle_secs.is_some_and(|idle| idle > self.stale_threshold_secs),
            idle_secs,
        }
    }
}

/// Health endpoint - always returns 200 if server is running
async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    Json(state.snapshot("ok"))
}

/// Ready endpoint - returns 200 only when streaming and not stale
async fn ready(State(state): State<ServerState>) -> (StatusCode, Json<HealthResponse>) {
    let mut response = state.snapshot("ready");
    if response.connected && !response.stale {
        (StatusCode::OK, Json(response))
    } else {
        response.status = "not_ready".to_string();
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

/// Metrics endpoint - Prometheus text format
async fn metrics() -> impl IntoResponse {
    match encode_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain")],
            e.to_string(),
        ),
    }
}

/// Create the health server router
pub fn create_router(state: ServerState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Run the health server
pub async fn run_server(addr: SocketAddr, state: ServerState) -> std::io::Result<()> {
    let app = create_router(state);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}
