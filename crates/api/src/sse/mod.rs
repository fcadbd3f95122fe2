//! Server-sent events transport for progress streams.
//!
//! Two wire shapes are produced from the same [`ProgressEvent`] channel:
//!
//! - [`named_events`]: `event: <name>` + `data: <json>` per event; the
//!   stream closes right after `end`.
//! - [`legacy_events`]: unnamed `data: <json>` lines, terminated by a
//!   literal `data: [DONE]` sentinel instead of an `end` event.

use std::convert::Infallible;
use std::time::Duration;

use axum::http::header::CACHE_CONTROL;
use axum::http::{HeaderName, HeaderValue};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use boardwright_events::ProgressEvent;
use futures::stream::{self, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Sentinel data line that ends a legacy stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Reconnect delay suggested to clients with the first event.
pub const CLIENT_RETRY: Duration = Duration::from_secs(3);

/// Comment text of keep-alive frames.
const KEEPALIVE_TEXT: &str = "heartbeat";

/// Named-event stream for the push protocol.
pub fn named_events(
    rx: mpsc::Receiver<ProgressEvent>,
) -> impl Stream<Item = Result<Event, Infallible>> + Send + 'static {
    ReceiverStream::new(rx).map(|event| {
        let mut sse = Event::default()
            .event(event.name())
            .data(event.payload().to_string());
        if matches!(event, ProgressEvent::Init { .. }) {
            sse = sse.retry(CLIENT_RETRY);
        }
        Ok(sse)
    })
}

/// Data-only stream for the legacy protocol, always ending in
/// [`DONE_SENTINEL`].
pub fn legacy_events(
    rx: mpsc::Receiver<ProgressEvent>,
) -> impl Stream<Item = Result<Event, Infallible>> + Send + 'static {
    ReceiverStream::new(rx)
        .filter(|event| std::future::ready(!event.is_terminal()))
        .map(|event| Ok(Event::default().data(event.payload().to_string())))
        .chain(stream::once(async {
            Ok(Event::default().data(DONE_SENTINEL))
        }))
}

/// Wrap an event stream into an SSE response with keep-alive comments and
/// proxy-friendly caching headers.
pub fn sse_response<S>(stream: S, keepalive: Duration) -> Response
where
    S: Stream<Item = Result<Event, Infallible>> + Send + 'static,
{
    (
        [
            (CACHE_CONTROL, HeaderValue::from_static("no-cache, no-transform")),
            (
                HeaderName::from_static("x-accel-buffering"),
                HeaderValue::from_static("no"),
            ),
        ],
        Sse::new(stream).keep_alive(KeepAlive::new().interval(keepalive).text(KEEPALIVE_TEXT)),
    )
        .into_response()
}
