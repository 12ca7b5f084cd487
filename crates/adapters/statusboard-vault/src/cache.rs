use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::config::DeliveryMethod;
use crate::credentials::Credentials;
use crate::error::CredentialError;
use crate::source::CredentialSource;

/// Last successfully fetched credentials, shared between request handlers
/// and the single background refresher.
#[derive(Clone)]
pub struct CredentialCache {
    method: DeliveryMethod,
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl CredentialCache {
    pub fn new(method: DeliveryMethod) -> Self {
        Self {
            method,
            values: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn method(&self) -> DeliveryMethod {
        self.method
    }

    pub async fn credentials(&self) -> Credentials {
        let values = self.values.read().await;
        Credentials::from_map(&values, self.method)
    }

    /// Fetch once from `source`. On failure the previous values stay in place.
    pub async fn refresh(&self, source: &mut CredentialSource) -> Result<usize, CredentialError> {
        let fresh = source.fetch().await?;
        let count = fresh.len();
        *self.values.write().await = fresh;
        Ok(count)
    }

    /// Refresh immediately, then every `interval`, until the task is aborted.
    pub fn spawn_refresher(
        &self,
        mut source: CredentialSource,
        interval: Duration,
    ) -> JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                match cache.refresh(&mut source).await {
                    Ok(keys) => {
                        tracing::debug!(keys, method = cache.method.as_str(), "Credentials refreshed");
                    },
                    Err(e) => {
                        tracing::warn!(method = cache.method.as_str(), error = %e, "Credential refresh failed");
                    },
                }
            }
        })
    }
}
