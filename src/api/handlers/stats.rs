//! Handler for the trusted-subnet internal statistics endpoint.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    Json,
    extract::{ConnectInfo, FromRequestParts, State},
    http::HeaderMap,
    http::request::Parts,
    response::{IntoResponse, Response},
};

use crate::api::dto::stats::StatsResponse;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_ip::client_ip;

/// Extracts the socket peer address if present, without failing when it
/// isn't (e.g. when the service isn't run with connect-info enabled).
pub(crate) struct OptionalConnectInfo(Option<SocketAddr>);

impl<S> FromRequestParts<S> for OptionalConnectInfo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalConnectInfo(
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| *addr),
        ))
    }
}

/// Returns aggregate URL and user counts.
///
/// # Endpoint
///
/// `GET /api/internal/stats`
///
/// Allowed only when the client IP (`X-Real-IP`, then `X-Forwarded-For`,
/// then the socket peer) lies in the configured trusted subnet; 403
/// otherwise, including when no subnet is configured.
pub async fn stats_handler(
    State(state): State<AppState>,
    OptionalConnectInfo(peer): OptionalConnectInfo,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let Some(trusted_subnet) = state.trusted_subnet else {
        return Err(AppError::forbidden("Forbidden"));
    };

    let client = client_ip(&headers, peer);
    let trusted = client.map(|ip| trusted_subnet.contains(ip)).unwrap_or(false);
    if !trusted {
        tracing::warn!(
            client_ip = ?client,
            trusted_subnet = %trusted_subnet,
            "stats access denied: IP not in trusted subnet"
        );
        return Err(AppError::forbidden("Forbidden"));
    }

    let stats = state.url_service.get_stats().await?;
    tracing::info!(urls = stats.urls, users = stats.users, "stats retrieved");

    Ok(Json(StatsResponse {
        urls: stats.urls,
        users: stats.users,
    })
    .into_response())
}
