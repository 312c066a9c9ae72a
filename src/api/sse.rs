//! Server-Sent Events support
//!
//! Bridges the engine's progress-event streams onto the wire and serves
//! the plain heartbeat endpoint.

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::StreamExt;

use crate::engine::ProgressEvent;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Convert a progress-event stream to an SSE response.
///
/// The client dropping the connection drops this stream, which drops the
/// flow's receiver — the producer then stops at its next send.
pub fn progress_sse<S>(events: S) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    S: Stream<Item = ProgressEvent> + Send + 'static,
{
    let stream = events.map(|event| {
        let data = serde_json::to_string(&event).unwrap_or_else(|_| "{}".to_string());
        Ok(Event::default().event(event.status()).data(data))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

/// Connection-check stream: one `connected` event, then periodic
/// heartbeats with a running counter.
pub fn heartbeat_sse() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let connected = futures::stream::once(async {
        Ok(Event::default()
            .event("connected")
            .data(json!({"type": "connected", "message": "连接成功"}).to_string()))
    });

    let beats = futures::stream::unfold(0u64, |count| async move {
        tokio::time::sleep(HEARTBEAT_INTERVAL).await;
        let count = count + 1;
        let event = Event::default()
            .event("heartbeat")
            .data(json!({"type": "heartbeat", "count": count}).to_string());
        Some((Ok(event), count))
    });

    Sse::new(connected.chain(beats)).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
