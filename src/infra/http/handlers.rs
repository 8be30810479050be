use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::debug;

use feedpulse_api_types::{
    DashboardData, DataResponse, HealthResponse, PostStats, ScrollStats, Timeframe,
    TrackAckResponse, TrackInteractionRequest, TrackPostViewRequest, TrackSessionRequest,
    TrackSessionResponse,
};

use crate::application::tracking::ClientMeta;

use super::ApiState;
use super::error::ApiError;

pub async fn track_session(
    State(state): State<ApiState>,
    meta: ClientMeta,
    Json(request): Json<TrackSessionRequest>,
) -> Result<Json<TrackSessionResponse>, ApiError> {
    let session_id = state.tracking.create_session(meta, request).await?;
    debug!(target = "feedpulse::http::track", session_id = %session_id, "session created");
    Ok(Json(TrackSessionResponse {
        success: true,
        session_id,
    }))
}

pub async fn track_interaction(
    State(state): State<ApiState>,
    meta: ClientMeta,
    Json(request): Json<TrackInteractionRequest>,
) -> Result<Json<TrackAckResponse>, ApiError> {
    state.tracking.record_interaction(meta, request).await?;
    Ok(Json(TrackAckResponse {
        success: true,
        message: "Interaction tracked successfully".to_string(),
    }))
}

pub async fn track_post_view(
    State(state): State<ApiState>,
    meta: ClientMeta,
    Json(request): Json<TrackPostViewRequest>,
) -> Result<Json<TrackAckResponse>, ApiError> {
    state.tracking.record_post_view(meta, request).await?;
    Ok(Json(TrackAckResponse {
        success: true,
        message: "Post view tracked successfully".to_string(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    timeframe: Option<String>,
}

pub async fn dashboard(
    State(state): State<ApiState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DataResponse<DashboardData>>, ApiError> {
    let timeframe = match query.timeframe.as_deref() {
        Some(raw) => raw
            .parse::<Timeframe>()
            .map_err(|err| ApiError::bad_request(err.to_string()))?,
        None => Timeframe::default(),
    };

    let data = state.analytics.dashboard(timeframe).await?;
    Ok(Json(DataResponse::new(data)))
}

#[derive(Debug, Deserialize)]
pub struct PostStatsQuery {
    ids: Option<String>,
}

pub async fn post_stats(
    State(state): State<ApiState>,
    Query(query): Query<PostStatsQuery>,
) -> Result<Json<DataResponse<Vec<PostStats>>>, ApiError> {
    let ids: Vec<String> = query
        .ids
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();

    if ids.is_empty() {
        return Err(ApiError::bad_request("Missing or invalid post IDs"));
    }

    let stats = state.analytics.post_stats(&ids).await?;
    Ok(Json(DataResponse::new(stats)))
}

pub async fn scroll_stats(
    State(state): State<ApiState>,
) -> Result<Json<DataResponse<ScrollStats>>, ApiError> {
    let stats = state.analytics.scroll_stats().await?;
    Ok(Json(DataResponse::new(stats)))
}

/// Liveness plus a storage probe. Always 200; a broken database shows
/// up as `database_connected: false`, not as a failed healthcheck.
pub async fn health(State(state): State<ApiState>) -> Json<HealthResponse> {
    let database_connected = state.health.ping().await.is_ok();
    Json(HealthResponse {
        success: true,
        database_connected,
        timestamp: OffsetDateTime::now_utc(),
    })
}
