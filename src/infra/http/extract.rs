//! Transport-level client metadata extraction.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::header::USER_AGENT;
use axum::http::request::Parts;

use crate::application::tracking::ClientMeta;
use crate::domain::device::DeviceInfo;

const FORWARDED_FOR: &str = "x-forwarded-for";

/// The client IP comes from the first `x-forwarded-for` entry when a
/// proxy supplied one, else the transport peer address. The device
/// classification comes from the user-agent header.
impl<S> FromRequestParts<S> for ClientMeta
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = parts
            .headers
            .get(FORWARDED_FOR)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let ip_address = forwarded
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|info| info.0.ip().to_string())
            })
            .unwrap_or_else(|| "unknown".to_string());

        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        Ok(ClientMeta {
            ip_address,
            device: DeviceInfo::from_user_agent(user_agent),
        })
    }
}
