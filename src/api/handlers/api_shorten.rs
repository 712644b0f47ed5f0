//! Handler for the JSON shorten endpoint.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::api::dto::shorten::{ShortenRequest, ShortenResponse};
use crate::api::middleware::auth::UserId;
use crate::error::AppError;
use crate::state::AppState;

/// Shortens a URL supplied as JSON.
///
/// # Endpoint
///
/// `POST /api/shorten`
///
/// `{"url": "..."}` in, 201 `{"result": "<base_url>/<short>"}` out. A
/// duplicate original yields 409 with the existing short link in `result`.
pub async fn api_shorten_handler(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Json(request): Json<ShortenRequest>,
) -> Result<Response, AppError> {
    if request.url.is_empty() {
        return Err(AppError::bad_request(
            "URL is required",
            json!({ "field": "url" }),
        ));
    }

    match state.url_service.add(&user_id, &request.url).await {
        Ok(short_url) => Ok((
            StatusCode::CREATED,
            Json(ShortenResponse {
                result: format!("{}/{}", state.base_url, short_url),
            }),
        )
            .into_response()),
        Err(AppError::UrlExists { short_url }) => Ok((
            StatusCode::CONFLICT,
            Json(ShortenResponse {
                result: format!("{}/{}", state.base_url, short_url),
            }),
        )
            .into_response()),
        Err(e) => Err(e),
    }
}
