use axum::Json;
use axum::extract::State;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::state::AppState;

/// Structured health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// RFC 3339 UTC time of the check.
    pub timestamp: String,
    pub agents_tracked: usize,
    /// Size of the status log file; the file is never parsed here.
    pub log_bytes: u64,
}

/// GET /health: liveness plus a cheap summary of what is being tracked.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let log_bytes = state.event_log.size_bytes().await;

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        agents_tracked: state.config.agents.len(),
        log_bytes,
    })
}
