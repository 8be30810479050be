//! Domain entities mirrored from persistent storage.
//!
//! Both entities are append-only: created once by the ingestion
//! endpoint, never updated or deleted.

use feedpulse_api_types::{ActionType, MediaType};
use serde::Serialize;
use serde_json::{Map, Value};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::device::DeviceInfo;

/// One browsing visit, keyed by `{ip}_{unix-millis}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub uuid: Uuid,
    pub ip_address: String,
    pub page_url: String,
    pub device: DeviceInfo,
    pub started_at: OffsetDateTime,
}

/// One recorded user action, stamped server-side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionRecord {
    pub uuid: Uuid,
    pub ip_address: String,
    pub action_type: ActionType,
    /// Present together with `post_username` or absent with it.
    pub post_id: Option<String>,
    pub post_username: Option<String>,
    pub session_id: Option<String>,
    pub occurred_at: OffsetDateTime,
    /// Flat action-specific key-value map; interpreted through
    /// `ActionDetail` where a typed shape is known.
    pub additional_data: Map<String, Value>,
    /// Dwell metrics, set only for `post_view` events.
    pub view: Option<PostViewMetrics>,
    pub device: DeviceInfo,
}

/// Dwell metrics carried by a post-view event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostViewMetrics {
    /// Seconds the post stayed in view; never negative.
    pub view_duration: f64,
    /// Scroll position at exit, normalized to its absolute value.
    pub scroll_percentage: i64,
    pub media_type: MediaType,
}
