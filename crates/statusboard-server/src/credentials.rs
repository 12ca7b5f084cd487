//! Credential demo endpoint, backed by the Vault adapter's cache.

use std::time::Duration;

use axum::Json;
use axum::extract::State;
use tokio::task::JoinHandle;

use statusboard_vault::{CredentialCache, CredentialSource, Credentials};

use crate::config::CredentialsFileConfig;
use crate::error::AppError;
use crate::state::AppState;

/// Build the credential source from config, start its refresher and return
/// the cache the handler reads from.
pub fn spawn_credential_refresher(
    file_config: &CredentialsFileConfig,
) -> Result<(CredentialCache, JoinHandle<()>), statusboard_vault::CredentialError> {
    let config = file_config.to_adapter_config()?;
    let source = CredentialSource::from_config(&config)?;
    let cache = CredentialCache::new(source.method());

    tracing::info!(
        method = config.method.as_str(),
        interval_secs = config.refresh_interval_secs,
        "Starting credential refresher"
    );
    let handle = cache.spawn_refresher(source, Duration::from_secs(config.refresh_interval_secs));
    Ok((cache, handle))
}

/// GET /api/credentials: the credentials as currently delivered.
pub async fn get_credentials(
    State(state): State<AppState>,
) -> Result<Json<Credentials>, AppError> {
    let cache = state
        .credentials
        .as_ref()
        .ok_or_else(|| AppError::NotFound("credentials are not configured".to_string()))?;
    Ok(Json(cache.credentials().await))
}
