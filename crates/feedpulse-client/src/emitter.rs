//! Event emission over the tracking API.
//!
//! Interaction and post-view emissions are fire-and-forget: they run
//! on detached tasks so the caller never blocks on network latency,
//! and failures are logged rather than surfaced.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Response, Url};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use feedpulse_api_types::{
    ActionDetail, ActionType, MediaType, TrackInteractionRequest, TrackPostViewRequest,
    TrackSessionRequest, TrackSessionResponse,
};

use crate::error::TrackerError;
use crate::session::SessionContext;

const DEFAULT_SESSION_DEADLINE: Duration = Duration::from_secs(1);
const DEFAULT_FLUSH_DEADLINE: Duration = Duration::from_millis(300);
const DEFAULT_FLUSH_FALLBACK_DEADLINE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub base_url: String,
    pub page_url: String,
    /// Bounded wait for session registration, shared by all callers.
    pub session_deadline: Duration,
    /// First-attempt deadline for the teardown scroll flush.
    pub flush_deadline: Duration,
    /// Retry deadline when the first flush attempt did not make it out.
    pub flush_fallback_deadline: Duration,
}

impl TrackerConfig {
    pub fn new(base_url: impl Into<String>, page_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            page_url: page_url.into(),
            session_deadline: DEFAULT_SESSION_DEADLINE,
            flush_deadline: DEFAULT_FLUSH_DEADLINE,
            flush_fallback_deadline: DEFAULT_FLUSH_FALLBACK_DEADLINE,
        }
    }
}

/// A tracked post reference; both halves travel together.
#[derive(Debug, Clone)]
pub struct PostRef {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Clone)]
pub struct InteractionEvent {
    pub action: ActionType,
    pub post: Option<PostRef>,
    pub detail: ActionDetail,
}

impl InteractionEvent {
    pub fn new(action: ActionType) -> Self {
        Self {
            action,
            post: None,
            detail: ActionDetail::None,
        }
    }

    pub fn on_post(mut self, post: PostRef) -> Self {
        self.post = Some(post);
        self
    }

    pub fn with_detail(mut self, detail: ActionDetail) -> Self {
        self.detail = detail;
        self
    }
}

#[derive(Debug, Clone)]
pub struct PostViewEvent {
    pub post: PostRef,
    /// Seconds the post stayed in view.
    pub view_duration: f64,
    pub scroll_percentage: i64,
    pub media_type: MediaType,
}

#[derive(Clone)]
pub struct Tracker {
    client: Client,
    base: Url,
    page_url: String,
    visitor: Uuid,
    session: Arc<SessionContext>,
    flush_deadline: Duration,
    flush_fallback_deadline: Duration,
}

impl Tracker {
    pub fn new(config: TrackerConfig, visitor: Uuid) -> Result<Self, TrackerError> {
        let base = Url::parse(&config.base_url)?.join("/")?;
        let client = Client::builder().user_agent(Self::user_agent()).build()?;
        Ok(Self {
            client,
            base,
            page_url: config.page_url,
            visitor,
            session: Arc::new(SessionContext::new(config.session_deadline)),
            flush_deadline: config.flush_deadline,
            flush_fallback_deadline: config.flush_fallback_deadline,
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("feedpulse-client/", env!("CARGO_PKG_VERSION"))
    }

    pub fn visitor(&self) -> Uuid {
        self.visitor
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    fn url(&self, path: &str) -> Result<Url, TrackerError> {
        self.base.join(path).map_err(TrackerError::Url)
    }

    /// Register a session, or return the one already established. Safe
    /// to call from any number of concurrent tasks.
    pub async fn ensure_session(&self) -> Result<String, TrackerError> {
        let client = self.client.clone();
        let url = self.url("track/session")?;
        let request = TrackSessionRequest {
            page_url: self.page_url.clone(),
            session_id: None,
            uuid: self.visitor,
        };

        let session_id = self
            .session
            .ensure(|| async move {
                let response = client.post(url).json(&request).send().await?;
                let response = check_status(response).await?;
                let body: TrackSessionResponse = response.json().await?;
                Ok(body.session_id)
            })
            .await?;
        Ok(session_id.to_string())
    }

    /// Emit an interaction and wait for the acknowledgement. An empty
    /// action type is dropped as a no-op rather than rejected, and so
    /// is any event whose session could not be established in time.
    pub async fn send_interaction(&self, event: InteractionEvent) -> Result<(), TrackerError> {
        if event.action.is_empty() {
            warn!("dropping interaction with empty action type");
            return Ok(());
        }

        // Without a session the event cannot be attributed; drop it
        // rather than emit an orphan.
        let session_id = match self.ensure_session().await {
            Ok(id) => id,
            Err(err) => {
                debug!(error = %err, "abandoning interaction, no session");
                return Ok(());
            }
        };

        let (post_id, post_username) = match event.post {
            Some(post) => (Some(post.id), Some(post.username)),
            None => (None, None),
        };
        let request = TrackInteractionRequest {
            session_id: Some(session_id),
            action_type: event.action,
            post_id,
            post_username,
            additional_data: event.detail.into_map(),
            uuid: self.visitor,
        };

        let response = self
            .client
            .post(self.url("track/interaction")?)
            .json(&request)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    /// Fire-and-forget variant of [`Tracker::send_interaction`]. The
    /// returned handle may be dropped to fully detach the task.
    pub fn record_interaction(&self, event: InteractionEvent) -> JoinHandle<()> {
        let tracker = self.clone();
        tokio::spawn(async move {
            if let Err(err) = tracker.send_interaction(event).await {
                warn!(error = %err, "interaction emission failed");
            }
        })
    }

    pub async fn send_post_view(&self, event: PostViewEvent) -> Result<(), TrackerError> {
        let session_id = match self.ensure_session().await {
            Ok(id) => id,
            Err(err) => {
                debug!(error = %err, "abandoning post view, no session");
                return Ok(());
            }
        };

        let request = TrackPostViewRequest {
            session_id: Some(session_id),
            post_id: event.post.id,
            post_username: event.post.username,
            view_duration: event.view_duration,
            scroll_percentage: event.scroll_percentage,
            media_type: event.media_type,
            uuid: self.visitor,
        };

        let response = self
            .client
            .post(self.url("track/post-view")?)
            .json(&request)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    /// Fire-and-forget variant of [`Tracker::send_post_view`].
    pub fn record_post_view(&self, event: PostViewEvent) -> JoinHandle<()> {
        let tracker = self.clone();
        tokio::spawn(async move {
            if let Err(err) = tracker.send_post_view(event).await {
                warn!(error = %err, "post view emission failed");
            }
        })
    }

    /// Emit the teardown scroll summary under an explicit deadline.
    /// Never registers a session: the event rides on whatever session
    /// exists, or none.
    pub(crate) async fn send_scroll_summary(
        &self,
        max_scroll_percentage: f64,
        deadline: Duration,
    ) -> Result<(), TrackerError> {
        let detail = ActionDetail::FinalMaxScroll {
            max_scroll_percentage,
        };
        let request = TrackInteractionRequest {
            session_id: self.session.current().map(str::to_string),
            action_type: ActionType::FinalMaxScroll,
            post_id: None,
            post_username: None,
            additional_data: detail.into_map(),
            uuid: self.visitor,
        };

        let response = self
            .client
            .post(self.url("track/interaction")?)
            .timeout(deadline)
            .json(&request)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    pub(crate) fn flush_deadline(&self) -> Duration {
        self.flush_deadline
    }

    pub(crate) fn flush_fallback_deadline(&self) -> Duration {
        self.flush_fallback_deadline
    }
}

async fn check_status(response: Response) -> Result<Response, TrackerError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(TrackerError::Server {
        status: status.as_u16(),
        body,
    })
}
