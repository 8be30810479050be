use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use feedpulse_api_types::ErrorResponse;

use crate::application::error::ErrorReport;
use crate::application::repos::RepoError;
use crate::application::tracking::TrackError;

/// API-facing error carrying the `{success:false, error}` envelope
/// every endpoint responds with on failure.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse::new(self.message.clone());
        let mut response = (self.status, Json(body)).into_response();
        // Attach a structured report so shared logging middleware can
        // emit rich diagnostics.
        ErrorReport::from_message("infra::http::api", self.status, self.message)
            .attach(&mut response);
        response
    }
}

impl From<TrackError> for ApiError {
    fn from(error: TrackError) -> Self {
        match error {
            TrackError::Validation(message) => ApiError::bad_request(message),
            TrackError::Repo(err) => ApiError::from(err),
        }
    }
}

impl From<RepoError> for ApiError {
    fn from(error: RepoError) -> Self {
        // Per-request storage failures surface as 500 with the
        // underlying message; single-row writes need no cleanup.
        ApiError::internal(error.to_string())
    }
}
