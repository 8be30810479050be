use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{ActionType, MediaType};

/// Body of `POST /track/session`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackSessionRequest {
    pub page_url: String,
    /// Previously cached session id, sent back for idempotent
    /// re-registration; the server still mints a fresh id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub uuid: Uuid,
}

/// Body of `POST /track/interaction`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackInteractionRequest {
    /// Absent when an event fires before a session is established
    /// (e.g. the teardown scroll flush racing session creation).
    #[serde(default)]
    pub session_id: Option<String>,
    pub action_type: ActionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_username: Option<String>,
    #[serde(default)]
    pub additional_data: Map<String, Value>,
    pub uuid: Uuid,
}

/// Body of `POST /track/post-view`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackPostViewRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    pub post_id: String,
    pub post_username: String,
    /// Dwell time in seconds.
    pub view_duration: f64,
    /// Scroll position at exit; negative values are normalized to
    /// their absolute value on ingest.
    pub scroll_percentage: i64,
    pub media_type: MediaType,
    pub uuid: Uuid,
}
