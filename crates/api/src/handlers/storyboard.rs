//! Handlers for `/storyboards` routes.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use boardwright_core::build::{BuildRequest, ProcessMode};
use boardwright_core::error::CoreError;
use boardwright_core::frame::{StatusCounts, StoryboardStatus};
use boardwright_core::trim::{trim_frames, TrimmedFrame, TrimmedRecord};
use boardwright_core::types::StoryboardId;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::sse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Skeleton returned by a build call; every frame is still `pending`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildResponse {
    pub storyboard_id: StoryboardId,
    pub title: String,
    pub process_mode: ProcessMode,
    pub frames_count: usize,
    pub frames: Vec<TrimmedFrame>,
}

/// Lightweight aggregate view for polling clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub storyboard_id: StoryboardId,
    pub status: StoryboardStatus,
    pub counts: StatusCounts,
    pub ready_count: usize,
    pub total: usize,
}

/// Query string of the legacy build-and-stream endpoint.
#[derive(Debug, Deserialize)]
pub struct LegacyStreamQuery {
    pub script: Option<String>,
    pub style: Option<String>,
    pub ratio: Option<String>,
}

// ---------------------------------------------------------------------------
// POST /storyboards
// ---------------------------------------------------------------------------

/// Validate the request, create the record and start generation in the
/// background. Responds before any frame has been generated.
pub async fn build_storyboard(
    State(state): State<AppState>,
    payload: Result<Json<BuildRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(body) = payload?;
    let handle = state.orchestrator.build(body).await?;
    let record = &handle.record;

    tracing::info!(
        storyboard_id = %record.id,
        frames = record.frames.len(),
        "Storyboard build accepted"
    );

    let response = BuildResponse {
        storyboard_id: record.id.clone(),
        title: record.display_title(),
        process_mode: handle.process_mode,
        frames_count: record.frames.len(),
        frames: trim_frames(&record.frames),
    };
    Ok((StatusCode::CREATED, Json(DataResponse { data: response })))
}

// ---------------------------------------------------------------------------
// GET /storyboards/{id}
// ---------------------------------------------------------------------------

pub async fn get_storyboard(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<TrimmedRecord>>> {
    let record = state
        .store
        .get(&id)
        .await
        .ok_or_else(|| CoreError::storyboard_not_found(&id))?;
    Ok(Json(DataResponse {
        data: TrimmedRecord::from(&record),
    }))
}

// ---------------------------------------------------------------------------
// GET /storyboards/{id}/status
// ---------------------------------------------------------------------------

pub async fn get_storyboard_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<StatusResponse>>> {
    let record = state
        .store
        .get(&id)
        .await
        .ok_or_else(|| CoreError::storyboard_not_found(&id))?;
    let counts = record.counts();
    Ok(Json(DataResponse {
        data: StatusResponse {
            storyboard_id: record.id,
            status: record.status,
            counts,
            ready_count: counts.ready,
            total: counts.total(),
        },
    }))
}

// ---------------------------------------------------------------------------
// GET /storyboards/{id}/stream
// ---------------------------------------------------------------------------

/// Push progress stream: `init`, `frame`*, `complete`, `end`.
pub async fn stream_storyboard(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let rx = state.broadcaster.push(&id).await?;
    tracing::debug!(storyboard_id = %id, "Push stream opened");
    Ok(sse::sse_response(
        sse::named_events(rx),
        state.config.stream_keepalive(),
    ))
}

// ---------------------------------------------------------------------------
// GET /storyboards/legacy-stream
// ---------------------------------------------------------------------------

/// Build and stream in one call, sampling the store on an interval.
pub async fn legacy_stream(
    State(state): State<AppState>,
    query: Result<Query<LegacyStreamQuery>, QueryRejection>,
) -> AppResult<Response> {
    let Query(query) = query?;
    let request = BuildRequest {
        script: query.script.unwrap_or_default(),
        style: query.style,
        aspect_ratio: query.ratio,
        ..BuildRequest::default()
    };
    let handle = state.orchestrator.build(request).await?;
    tracing::debug!(storyboard_id = %handle.record.id, "Legacy stream opened");

    // Start from the pending skeleton, not a fresh read: workers may already
    // have finished frames the client has not been told about.
    let rx = state.broadcaster.poll(handle.record);
    Ok(sse::sse_response(
        sse::legacy_events(rx),
        state.config.stream_keepalive(),
    ))
}
