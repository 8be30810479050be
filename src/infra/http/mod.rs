mod error;
mod extract;
mod handlers;
mod middleware;

pub use error::ApiError;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;

use crate::application::analytics::AnalyticsService;
use crate::application::repos::HealthRepo;
use crate::application::tracking::TrackingService;

#[derive(Clone)]
pub struct ApiState {
    pub tracking: Arc<TrackingService>,
    pub analytics: Arc<AnalyticsService>,
    pub health: Arc<dyn HealthRepo>,
}

/// Assemble the full route table. CORS is permissive: the tracker runs
/// on arbitrary third-party origins.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/track/session", post(handlers::track_session))
        .route("/track/interaction", post(handlers::track_interaction))
        .route("/track/post-view", post(handlers::track_post_view))
        .route("/analytics/dashboard", get(handlers::dashboard))
        .route("/posts/stats", get(handlers::post_stats))
        .route("/session/scroll-stats", get(handlers::scroll_stats))
        .route("/health", get(handlers::health))
        .layer(axum::middleware::from_fn(middleware::log_responses))
        .layer(axum::middleware::from_fn(middleware::set_request_context))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
