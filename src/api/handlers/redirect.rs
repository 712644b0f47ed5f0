//! Handler for short URL redirects.

use axum::{
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::api::middleware::auth::UserId;
use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short URL to its original URL.
///
/// # Endpoint
///
/// `GET /{id}`
///
/// 307 with a `Location` header and an empty body for live records, 410 for
/// tombstoned ones, 404 otherwise.
pub async fn redirect_handler(
    State(state): State<AppState>,
    _user_id: UserId,
    Path(short_url): Path<String>,
) -> Result<Response, AppError> {
    tracing::debug!(short_url, "resolving short URL");
    let original_url = state.url_service.get_by_short_url(&short_url).await?;

    Ok((
        StatusCode::TEMPORARY_REDIRECT,
        [
            (header::LOCATION, original_url),
            (header::CONTENT_TYPE, "text/plain".to_string()),
        ],
    )
        .into_response())
}
