use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use axum::extract::State;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use futures::stream::Stream;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

use statusboard_core::StatusEvent;

use crate::error::AppError;
use crate::state::{AppState, ConnectionGuard};

/// SSE event name for appended status rows.
pub const STATUS_EVENT: &str = "status";

/// GET /api/events/stream: appended status rows as server-sent events.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>, AppError> {
    let max_sse = state.config.limits.max_sse_subscribers;
    let current = state.sse_subscriber_count.load(Ordering::Relaxed);
    if current >= max_sse {
        tracing::warn!(current, max = max_sse, "SSE subscriber limit reached");
        return Err(AppError::Unavailable(
            "too many event stream subscribers".to_string(),
        ));
    }

    let guard = ConnectionGuard::new(Arc::clone(&state.sse_subscriber_count));

    let rx = state.event_log.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(move |result: Result<StatusEvent, _>| {
        let _guard = &guard;
        match result {
            Ok(event) => match SseEvent::default().event(STATUS_EVENT).json_data(&event) {
                Ok(sse) => Some(Ok(sse)),
                Err(e) => {
                    tracing::warn!("Failed to encode SSE event: {e}");
                    None
                },
            },
            Err(e) => {
                tracing::warn!("SSE broadcast receive error: {e}");
                None
            },
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
