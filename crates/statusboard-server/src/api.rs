use axum::extract::{Path, State};
use axum::response::Json;
use chrono::Utc;
use serde::Serialize;

use statusboard_core::{
    AggregateState, ConcurrencySeries, StatusEvent, compute_concurrency_series,
    compute_current_status,
};

use crate::error::AppError;
use crate::event_log::recent;
use crate::state::AppState;

/// Response for `GET /api/status`.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub current: AggregateState,
    /// Most recent raw rows, newest first.
    pub log: Vec<StatusEvent>,
}

/// Response for a successful status update.
#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub ok: bool,
}

/// Reject values that would corrupt the log or the dashboard.
fn validate_field(name: &str, value: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{name} must not be empty")));
    }
    if value.len() > max_len {
        return Err(AppError::BadRequest(format!("{name} exceeds {max_len} bytes")));
    }
    if value.chars().any(char::is_control) {
        return Err(AppError::BadRequest(format!("{name} contains control characters")));
    }
    Ok(())
}

/// GET /api/status: current status of every agent plus the recent log.
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let rows = state.event_log.read_all().await;
    let current = compute_current_status(&rows, &state.config.agents, Utc::now());
    let log = recent(&rows, state.config.limits.recent_log_rows);
    Json(StatusResponse { current, log })
}

/// GET /api/concurrency: step series of working-agent counts.
pub async fn get_concurrency(State(state): State<AppState>) -> Json<ConcurrencySeries> {
    let rows = state.event_log.read_all().await;
    Json(compute_concurrency_series(&rows, &state.config.agents, Utc::now()))
}

/// POST /api/update/{agent_name}/{status}: append a row stamped now.
pub async fn post_update(
    State(state): State<AppState>,
    Path((agent_name, status)): Path<(String, String)>,
) -> Result<Json<UpdateResponse>, AppError> {
    let max_len = state.config.limits.max_field_len;
    validate_field("agent_name", &agent_name, max_len)?;
    validate_field("status", &status, max_len)?;

    if !state.config.agents.contains(&agent_name) {
        tracing::debug!(agent = %agent_name, "Update for an agent outside the configured list");
    }

    let event = StatusEvent::now(agent_name, status);
    state.event_log.append(&event).await?;

    Ok(Json(UpdateResponse { ok: true }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LimitsConfig, ServerConfig};
    use statusboard_core::test_helpers::{event_at, t0};

    fn test_state(dir: &tempfile::TempDir) -> AppState {
        AppState::new(ServerConfig {
            log_path: dir.path().join("agent_status.csv"),
            agents: vec!["UI Agent".to_string(), "Testing Agent".to_string()],
            ..ServerConfig::default()
        })
    }

    fn update(agent: &str, status: &str) -> Path<(String, String)> {
        Path((agent.to_string(), status.to_string()))
    }

    #[tokio::test]
    async fn status_on_empty_log() {
        let dir = tempfile::tempdir().unwrap();
        let Json(resp) = get_status(State(test_state(&dir))).await;
        assert_eq!(resp.current.len(), 2);
        assert_eq!(resp.current.get("UI Agent").unwrap().timestamp, "never");
        assert!(resp.log.is_empty());
    }

    #[tokio::test]
    async fn update_then_status() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);

        let Json(resp) = post_update(State(state.clone()), update("UI Agent", "working"))
            .await
            .unwrap();
        assert!(resp.ok);

        let Json(status) = get_status(State(state)).await;
        let ui = status.current.get("UI Agent").unwrap();
        assert_eq!(ui.status, "working");
        assert_ne!(ui.timestamp, "never");
        assert_eq!(status.log.len(), 1);
        assert_eq!(status.log[0].agent_name, "UI Agent");
    }

    #[tokio::test]
    async fn status_log_is_bounded_and_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(ServerConfig {
            log_path: dir.path().join("agent_status.csv"),
            limits: LimitsConfig {
                recent_log_rows: 3,
                ..LimitsConfig::default()
            },
            ..ServerConfig::default()
        });
        for i in 0..5 {
            let row = event_at(i, "UI Agent", "idle");
            state.event_log.append(&row).await.unwrap();
        }

        let Json(status) = get_status(State(state)).await;
        assert_eq!(status.log.len(), 3);
        assert_eq!(status.log[0], event_at(4, "UI Agent", "idle"));
    }

    #[tokio::test]
    async fn concurrency_counts_working_agents() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let log = &state.event_log;
        log.append(&event_at(0, "UI Agent", "working")).await.unwrap();
        log.append(&event_at(10, "Testing Agent", "working")).await.unwrap();
        log.append(&event_at(20, "UI Agent", "idle")).await.unwrap();

        let Json(series) = get_concurrency(State(state)).await;
        let counts: Vec<usize> = series.points.iter().map(|p| p.count).collect();
        assert_eq!(counts, vec![1, 2, 1]);
        assert_eq!(series.max_agents, 2);
        assert_eq!(series.t_min, t0());
    }

    #[tokio::test]
    async fn update_rejects_oversized_values() {
        let dir = tempfile::tempdir().unwrap();
        let long = "x".repeat(129);
        let result = post_update(State(test_state(&dir)), update(&long, "working")).await;
        assert!(matches!(result.unwrap_err(), AppError::BadRequest(m) if m.contains("agent_name")));
    }

    #[tokio::test]
    async fn update_rejects_control_characters() {
        let dir = tempfile::tempdir().unwrap();
        let result = post_update(State(test_state(&dir)), update("UI Agent", "work\ning")).await;
        assert!(matches!(result.unwrap_err(), AppError::BadRequest(m) if m.contains("status")));
    }

    #[tokio::test]
    async fn update_rejects_blank_values() {
        let dir = tempfile::tempdir().unwrap();
        let result = post_update(State(test_state(&dir)), update("   ", "working")).await;
        assert!(matches!(result.unwrap_err(), AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn update_accepts_unlisted_agent() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        post_update(State(state.clone()), update("Stranger", "working"))
            .await
            .unwrap();

        let Json(status) = get_status(State(state)).await;
        assert!(status.current.get("Stranger").is_none());
        assert_eq!(status.log[0].agent_name, "Stranger");
    }
}
