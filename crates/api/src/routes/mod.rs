pub mod health;
pub mod storyboard;

use std::time::Duration;

use axum::http::StatusCode;
use axum::Router;
use tower_http::timeout::TimeoutLayer;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /storyboards                      POST build                      (timeout)
/// /storyboards/{id}                 GET  record                     (timeout)
/// /storyboards/{id}/status          GET  aggregate status           (timeout)
/// /storyboards/legacy-stream        GET  build + poll stream (SSE)
/// /storyboards/{id}/stream          GET  push stream (SSE)
/// ```
///
/// JSON routes answer `408` once `request_timeout` elapses.
pub fn api_routes(request_timeout: Duration) -> Router<AppState> {
    let json = storyboard::json_routes().layer(TimeoutLayer::with_status_code(
        StatusCode::REQUEST_TIMEOUT,
        request_timeout,
    ));
    Router::new().nest(
        "/storyboards",
        json.merge(storyboard::stream_routes()),
    )
}
