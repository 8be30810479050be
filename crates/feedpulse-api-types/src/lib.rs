//! Wire contracts shared by the Feedpulse server and tracker clients.
//!
//! Every HTTP body in the tracking and reporting API is defined here so
//! that both sides agree on field names and the `{success, ...}`
//! response envelope.

mod action;
mod requests;
mod responses;
mod timeframe;

pub use action::{ActionDetail, ActionType, derive_post_id};
pub use requests::{TrackInteractionRequest, TrackPostViewRequest, TrackSessionRequest};
pub use responses::{
    ActionCount, DashboardData, DataResponse, DeviceCount, ErrorResponse, HealthResponse,
    HourCount, PostActivity, PostStats, ScrollStats, TrackAckResponse, TrackSessionResponse,
};
pub use timeframe::Timeframe;

use serde::{Deserialize, Serialize};

/// Coarse device bucket derived from the user-agent string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Mobile,
    Desktop,
}

impl DeviceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Mobile => "mobile",
            DeviceClass::Desktop => "desktop",
        }
    }
}

impl std::fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Media rendered by a viewed post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
        }
    }
}
