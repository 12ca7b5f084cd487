pub mod api;
pub mod config;
#[cfg(feature = "credentials")]
pub mod credentials;
pub mod error;
pub mod event_log;
pub mod health;
pub mod sse;
pub mod state;

use axum::Router;
use axum::routing::{get, post};
use tower_http::services::ServeDir;

use config::ServerConfig;
use state::AppState;

/// Build the Axum router and application state from a config.
///
/// Must be called inside a Tokio runtime: a configured credential source
/// starts its refresher here.
pub fn build_app(config: ServerConfig) -> (Router<()>, AppState) {
    let web_root = config.web_root.clone();
    #[allow(unused_mut)]
    let mut state = AppState::new(config);

    #[cfg(feature = "credentials")]
    if let Some(ref creds) = state.config.credentials {
        match credentials::spawn_credential_refresher(creds) {
            Ok((cache, _refresher)) => state.credentials = Some(cache),
            Err(e) => tracing::error!("Credential source unavailable: {e}"),
        }
    }

    let api_routes = Router::new()
        .route("/status", get(api::get_status))
        .route("/concurrency", get(api::get_concurrency))
        .route("/update/{agent_name}/{status}", post(api::post_update))
        .route("/events/stream", get(sse::event_stream));

    #[cfg(feature = "credentials")]
    let api_routes = api_routes.route("/credentials", get(credentials::get_credentials));

    let app = Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api_routes)
        .fallback_service(ServeDir::new(&web_root))
        .with_state(state.clone());

    (app, state)
}

/// Write the initial rows for an empty log if seeding is enabled.
pub async fn seed_event_log(state: &AppState) -> Result<usize, csv::Error> {
    if !state.config.seed_on_empty {
        return Ok(0);
    }
    state.event_log.seed_if_empty(&state.config.agents).await
}
