//! Operational endpoints: health, readiness and liveness probes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use campaign_management::WizardSessions;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

/// Shared application state for operational handlers.
#[derive(Clone)]
pub struct AppState {
    pub node_id: String,
    pub start_time: Instant,
    pub sessions: Arc<WizardSessions>,
    pub max_sessions: usize,
}

/// GET /health — Health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        node_id: state.node_id.clone(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        active_sessions: state.sessions.len(),
    })
}

/// GET /ready — Readiness probe for Kubernetes.
/// Returns 503 while the wizard session registry is full.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.sessions.len() < state.max_sessions {
        StatusCode::OK
    } else {
        warn!(max_sessions = state.max_sessions, "Session registry full, not ready");
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /live — Liveness probe for Kubernetes.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub node_id: String,
    pub uptime_secs: u64,
    pub active_sessions: usize,
}
