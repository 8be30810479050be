//! Ingestion-side service: validates, stamps and persists incoming
//! tracking events.
//!
//! Stamping is authoritative on this side of the wire: the client IP,
//! device classification and event timestamp recorded here override
//! anything a client could claim.

use std::sync::Arc;

use feedpulse_api_types::{
    ActionType, TrackInteractionRequest, TrackPostViewRequest, TrackSessionRequest,
};
use metrics::counter;
use serde_json::{Map, Value};
use thiserror::Error;
use time::OffsetDateTime;

use crate::application::repos::{InteractionsRepo, RepoError, SessionsRepo};
use crate::domain::device::DeviceInfo;
use crate::domain::entities::{InteractionRecord, PostViewMetrics, SessionRecord};

/// Client facts derived from transport-level request metadata, never
/// from the request body.
#[derive(Debug, Clone)]
pub struct ClientMeta {
    pub ip_address: String,
    pub device: DeviceInfo,
}

#[derive(Debug, Error)]
pub enum TrackError {
    #[error("invalid tracking payload: {0}")]
    Validation(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl TrackError {
    fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

pub struct TrackingService {
    sessions: Arc<dyn SessionsRepo>,
    interactions: Arc<dyn InteractionsRepo>,
}

impl TrackingService {
    pub fn new(sessions: Arc<dyn SessionsRepo>, interactions: Arc<dyn InteractionsRepo>) -> Self {
        Self {
            sessions,
            interactions,
        }
    }

    /// Mint a session keyed by `{ip}_{unix-millis}` and persist it.
    /// Each call produces a new record; concurrent creations from the
    /// same visitor are not deduplicated.
    pub async fn create_session(
        &self,
        meta: ClientMeta,
        request: TrackSessionRequest,
    ) -> Result<String, TrackError> {
        let started_at = OffsetDateTime::now_utc();
        let millis = started_at.unix_timestamp_nanos() / 1_000_000;
        let session_id = format!("{}_{}", meta.ip_address, millis);

        let record = SessionRecord {
            session_id: session_id.clone(),
            uuid: request.uuid,
            ip_address: meta.ip_address,
            page_url: request.page_url,
            device: meta.device,
            started_at,
        };

        self.sessions.insert_session(record).await?;
        counter!("feedpulse_sessions_created_total").increment(1);
        Ok(session_id)
    }

    pub async fn record_interaction(
        &self,
        meta: ClientMeta,
        request: TrackInteractionRequest,
    ) -> Result<(), TrackError> {
        validate_action_type(&request.action_type)?;
        validate_post_pairing(request.post_id.as_deref(), request.post_username.as_deref())?;
        validate_flat_map(&request.additional_data)?;

        let record = InteractionRecord {
            uuid: request.uuid,
            ip_address: meta.ip_address,
            action_type: request.action_type,
            post_id: request.post_id,
            post_username: request.post_username,
            session_id: request.session_id,
            occurred_at: OffsetDateTime::now_utc(),
            additional_data: request.additional_data,
            view: None,
            device: meta.device,
        };

        self.persist(record).await
    }

    pub async fn record_post_view(
        &self,
        meta: ClientMeta,
        request: TrackPostViewRequest,
    ) -> Result<(), TrackError> {
        if !request.view_duration.is_finite() || request.view_duration < 0.0 {
            return Err(TrackError::validation(
                "view_duration must be a non-negative number of seconds",
            ));
        }

        let record = InteractionRecord {
            uuid: request.uuid,
            ip_address: meta.ip_address,
            action_type: ActionType::PostView,
            post_id: Some(request.post_id),
            post_username: Some(request.post_username),
            session_id: request.session_id,
            occurred_at: OffsetDateTime::now_utc(),
            additional_data: Map::new(),
            view: Some(PostViewMetrics {
                view_duration: request.view_duration,
                // Some clients report exit positions as negative offsets.
                // `saturating_abs` keeps i64::MIN from overflowing.
                scroll_percentage: request.scroll_percentage.saturating_abs(),
                media_type: request.media_type,
            }),
            device: meta.device,
        };

        self.persist(record).await
    }

    async fn persist(&self, record: InteractionRecord) -> Result<(), TrackError> {
        self.interactions.insert_interaction(record).await?;
        counter!("feedpulse_events_ingested_total").increment(1);
        Ok(())
    }
}

fn validate_action_type(action: &ActionType) -> Result<(), TrackError> {
    if action.is_empty() {
        counter!("feedpulse_events_rejected_total").increment(1);
        return Err(TrackError::validation("action_type must not be empty"));
    }
    Ok(())
}

fn validate_post_pairing(
    post_id: Option<&str>,
    post_username: Option<&str>,
) -> Result<(), TrackError> {
    if post_id.is_some() != post_username.is_some() {
        counter!("feedpulse_events_rejected_total").increment(1);
        return Err(TrackError::validation(
            "post_id and post_username must be present together or both absent",
        ));
    }
    Ok(())
}

fn validate_flat_map(data: &Map<String, Value>) -> Result<(), TrackError> {
    let nested = data
        .values()
        .any(|value| matches!(value, Value::Object(_) | Value::Array(_)));
    if nested {
        counter!("feedpulse_events_rejected_total").increment(1);
        return Err(TrackError::validation(
            "additional_data must be a flat key-value map",
        ));
    }
    Ok(())
}
