//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use feedpulse_api_types::{ActionType, DeviceClass};
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::{InteractionRecord, SessionRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Count of one action type inside a time window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionCountRow {
    pub action_type: ActionType,
    pub count: u64,
}

/// Interaction count for one post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostCountRow {
    pub post_id: String,
    pub post_username: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCountRow {
    pub device_type: DeviceClass,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourCountRow {
    pub hour: u8,
    pub count: u64,
}

/// Per-post, per-action count used by the bulk stats endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostActionCountRow {
    pub post_id: String,
    pub action_type: ActionType,
    pub count: u64,
}

/// Aggregate over all recorded scroll-summary events. `None` when no
/// such event exists yet.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollSummaryRow {
    pub average_max_scroll: f64,
    pub highest_max_scroll: f64,
    pub total_events: u64,
    pub uuids: Vec<Uuid>,
}

#[async_trait]
pub trait SessionsRepo: Send + Sync {
    async fn insert_session(&self, record: SessionRecord) -> Result<(), RepoError>;
}

#[async_trait]
pub trait InteractionsRepo: Send + Sync {
    async fn insert_interaction(&self, record: InteractionRecord) -> Result<(), RepoError>;
}

/// Read-only grouping queries over the event store. Every query is
/// recomputed from scratch per request; results must not depend on
/// insertion order.
#[async_trait]
pub trait AggregatesRepo: Send + Sync {
    async fn count_interactions(&self, since: OffsetDateTime) -> Result<u64, RepoError>;

    async fn count_distinct_visitor_ips(&self, since: OffsetDateTime) -> Result<u64, RepoError>;

    async fn action_breakdown(
        &self,
        since: OffsetDateTime,
    ) -> Result<Vec<ActionCountRow>, RepoError>;

    async fn top_posts(
        &self,
        since: OffsetDateTime,
        limit: u32,
    ) -> Result<Vec<PostCountRow>, RepoError>;

    async fn device_breakdown(
        &self,
        since: OffsetDateTime,
    ) -> Result<Vec<DeviceCountRow>, RepoError>;

    /// Hours with zero events are omitted; the service zero-fills.
    async fn hourly_activity(&self, since: OffsetDateTime)
    -> Result<Vec<HourCountRow>, RepoError>;

    async fn post_action_counts(
        &self,
        post_ids: &[String],
    ) -> Result<Vec<PostActionCountRow>, RepoError>;

    async fn scroll_summary(&self) -> Result<Option<ScrollSummaryRow>, RepoError>;
}

/// Degraded-health probe over the storage connection.
#[async_trait]
pub trait HealthRepo: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}
