//! Handler for the per-user URL listing.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::api::dto::user_urls::UserUrlItem;
use crate::api::middleware::auth::UserId;
use crate::error::AppError;
use crate::state::AppState;

/// Lists every URL owned by the calling user.
///
/// # Endpoint
///
/// `GET /api/user/urls`
///
/// 200 with the list, or 204 when the user owns nothing.
pub async fn user_urls_handler(
    State(state): State<AppState>,
    UserId(user_id): UserId,
) -> Result<Response, AppError> {
    let urls = state.url_service.get_user_urls(&user_id).await?;
    tracing::debug!(user_id, count = urls.len(), "listed user URLs");

    if urls.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let response: Vec<UserUrlItem> = urls
        .into_iter()
        .map(|url| UserUrlItem {
            short_url: format!("{}/{}", state.base_url, url.short_url),
            original_url: url.original_url,
        })
        .collect();

    Ok((StatusCode::OK, Json(response)).into_response())
}
