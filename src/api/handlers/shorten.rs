//! Handler for the plain-text shorten endpoint.

use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::api::middleware::auth::UserId;
use crate::error::AppError;
use crate::state::AppState;

/// Shortens the URL given as the raw request body.
///
/// # Endpoint
///
/// `POST /`
///
/// Returns 201 with a `text/plain` body `<base_url>/<short>`. A URL that is
/// already mapped yields 409 with the same body shape, pointing at the
/// existing short URL.
pub async fn shorten_handler(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    body: String,
) -> Result<Response, AppError> {
    if body.is_empty() {
        return Err(AppError::bad_request(
            "original URL is empty",
            json!({ "field": "body" }),
        ));
    }

    match state.url_service.add(&user_id, &body).await {
        Ok(short_url) => Ok((
            StatusCode::CREATED,
            [(header::CONTENT_TYPE, "text/plain")],
            format!("{}/{}", state.base_url, short_url),
        )
            .into_response()),
        Err(AppError::UrlExists { short_url }) => Ok((
            StatusCode::CONFLICT,
            [(header::CONTENT_TYPE, "text/plain")],
            format!("{}/{}", state.base_url, short_url),
        )
            .into_response()),
        Err(e) => Err(e),
    }
}
