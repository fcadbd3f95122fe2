use axum::routing::{get, post};
use axum::Router;

use crate::handlers::storyboard;
use crate::state::AppState;

/// Request/response routes mounted at `/storyboards`.
pub fn json_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(storyboard::build_storyboard))
        .route("/{id}", get(storyboard::get_storyboard))
        .route("/{id}/status", get(storyboard::get_storyboard_status))
}

/// Server-sent event routes mounted at `/storyboards`.
///
/// Kept apart so the request timeout never applies to a live stream.
pub fn stream_routes() -> Router<AppState> {
    Router::new()
        .route("/legacy-stream", get(storyboard::legacy_stream))
        .route("/{id}/stream", get(storyboard::stream_storyboard))
}
