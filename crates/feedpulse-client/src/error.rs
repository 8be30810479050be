use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("invalid base URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server rejected request: status {status} body {body}")]
    Server { status: u16, body: String },
    #[error("identity store error: {0}")]
    Identity(#[source] std::io::Error),
    #[error("session registration timed out")]
    SessionTimeout,
}
