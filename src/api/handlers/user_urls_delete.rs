//! Handler for asynchronous per-user URL deletion.

use axum::{Json, extract::State, http::StatusCode, response::Response};
use serde_json::json;

use crate::api::middleware::auth::UserId;
use crate::error::AppError;
use crate::state::AppState;

use super::json_response;

/// Queues the listed short URLs for deletion.
///
/// # Endpoint
///
/// `DELETE /api/user/urls`
///
/// Answers 202 immediately; the actual tombstoning happens in the delete
/// worker and only affects records owned by the caller.
pub async fn user_urls_delete_handler(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Json(short_urls): Json<Vec<String>>,
) -> Result<Response, AppError> {
    if short_urls.is_empty() {
        return Err(AppError::bad_request(
            "no URLs provided for deletion",
            json!({ "field": "body" }),
        ));
    }

    state.url_service.delete_user_urls(&user_id, short_urls);

    Ok(json_response(StatusCode::ACCEPTED, json!("accepted")))
}
