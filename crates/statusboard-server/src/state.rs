use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::ServerConfig;
use crate::event_log::EventLog;

pub type SharedEventLog = Arc<EventLog>;

#[derive(Clone)]
pub struct AppState {
    pub event_log: SharedEventLog,
    pub config: Arc<ServerConfig>,
    pub sse_subscriber_count: Arc<AtomicUsize>,
    /// Present when a `[credentials]` section is configured.
    #[cfg(feature = "credentials")]
    pub credentials: Option<statusboard_vault::CredentialCache>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let event_log =
            EventLog::with_capacity(config.log_path.clone(), config.limits.broadcast_capacity);
        Self {
            event_log: Arc::new(event_log),
            config: Arc::new(config),
            sse_subscriber_count: Arc::new(AtomicUsize::new(0)),
            #[cfg(feature = "credentials")]
            credentials: None,
        }
    }
}

/// Counts one live connection for as long as it is held.
pub struct ConnectionGuard {
    count: Arc<AtomicUsize>,
}

impl ConnectionGuard {
    pub fn new(count: Arc<AtomicUsize>) -> Self {
        count.fetch_add(1, Ordering::Relaxed);
        Self { count }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.count.fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_tracks_count() {
        let count = Arc::new(AtomicUsize::new(0));
        let a = ConnectionGuard::new(Arc::clone(&count));
        let b = ConnectionGuard::new(Arc::clone(&count));
        assert_eq!(count.load(Ordering::Relaxed), 2);
        drop(a);
        assert_eq!(count.load(Ordering::Relaxed), 1);
        drop(b);
        assert_eq!(count.load(Ordering::Relaxed), 0);
    }
}
