use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{ActionType, DeviceClass, Timeframe};

/// Success envelope carrying an aggregate payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Failure envelope; every non-2xx body has this shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// Response of `POST /track/session`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackSessionResponse {
    pub success: bool,
    pub session_id: String,
}

/// Acknowledgement for the event write endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackAckResponse {
    pub success: bool,
    pub message: String,
}

/// Response of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub success: bool,
    pub database_connected: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Payload of `GET /analytics/dashboard`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardData {
    pub total_interactions: u64,
    pub unique_users: u64,
    pub interaction_breakdown: Vec<ActionCount>,
    pub popular_posts: Vec<PostActivity>,
    pub device_breakdown: Vec<DeviceCount>,
    /// All 24 hours, zero-filled, sorted ascending.
    pub hourly_activity: Vec<HourCount>,
    pub timeframe: Timeframe,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCount {
    pub action_type: ActionType,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostActivity {
    pub post_id: String,
    pub post_username: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCount {
    pub device_type: DeviceClass,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourCount {
    /// Hour of day, 0-23, from the server-stamped event timestamp.
    pub hour: u8,
    pub count: u64,
}

/// One entry of `GET /posts/stats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostStats {
    pub post_id: String,
    pub views: u64,
    pub likes: u64,
    pub saves: u64,
    pub shares: u64,
    pub comments: u64,
}

impl PostStats {
    pub fn empty(post_id: impl Into<String>) -> Self {
        Self {
            post_id: post_id.into(),
            views: 0,
            likes: 0,
            saves: 0,
            shares: 0,
            comments: 0,
        }
    }
}

/// Payload of `GET /session/scroll-stats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollStats {
    pub average_max_scroll: f64,
    pub highest_max_scroll: f64,
    pub total_sessions: u64,
    /// Distinct visitors that produced a scroll summary; duplicate
    /// teardown emissions collapse here.
    pub uuids: Vec<Uuid>,
}
