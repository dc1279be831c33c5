//! Realtime event stream
//!
//! Recipient-keyed SSE channel. Connecting registers the user's delivery
//! handle in the connection registry; dropping the stream deregisters it.
//! Events are at-most-once: nothing is queued or replayed for clients that
//! connect late (the durable notification records cover that).

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use tokio_stream::{wrappers::UnboundedReceiverStream, Stream, StreamExt};

use crate::middleware::CurrentUser;
use crate::realtime::ConnectionGuard;
use crate::AppState;

/// Subscribe to the authenticated user's live events.
pub async fn stream_events(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let user_id = current.0.user_id;
    let rx = state.registry.register(user_id);
    let guard = ConnectionGuard::new(state.registry.clone(), user_id);

    tracing::debug!("Live connection registered for {}", user_id);

    let stream = UnboundedReceiverStream::new(rx).map(move |live| {
        // Holding the guard inside the closure ties deregistration to the
        // stream's lifetime.
        let _ = &guard;
        let payload = serde_json::to_string(&live).unwrap_or_else(|_| "{}".to_string());
        Ok(Event::default().event(live.event.as_str()).data(payload))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
