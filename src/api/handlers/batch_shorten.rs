//! Handler for the batch shorten endpoint.

use std::collections::HashMap;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::api::dto::shorten::{ShortenBatchRequestItem, ShortenBatchResponseItem};
use crate::api::middleware::auth::UserId;
use crate::error::AppError;
use crate::state::AppState;

/// Shortens a batch of URLs, pairing results with the caller's correlation
/// ids.
///
/// # Endpoint
///
/// `POST /api/shorten/batch`
///
/// Items with an empty `correlation_id` or `original_url` are dropped
/// silently. Originals that already have a mapping come back with the
/// existing short URL.
pub async fn batch_shorten_handler(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Json(requests): Json<Vec<ShortenBatchRequestItem>>,
) -> Result<Response, AppError> {
    if requests.is_empty() {
        return Err(AppError::bad_request(
            "request body is empty",
            json!({ "field": "body" }),
        ));
    }

    let mut original_urls = Vec::with_capacity(requests.len());
    let mut correlation_by_original: HashMap<String, String> = HashMap::new();
    for request in requests {
        if request.correlation_id.is_empty() || request.original_url.is_empty() {
            continue;
        }
        original_urls.push(request.original_url.clone());
        correlation_by_original.insert(request.original_url, request.correlation_id);
    }

    let shortened = state.url_service.add_batch(&user_id, &original_urls).await?;

    let response: Vec<ShortenBatchResponseItem> = shortened
        .into_iter()
        .filter_map(|url| {
            correlation_by_original
                .get(&url.original_url)
                .map(|correlation_id| ShortenBatchResponseItem {
                    correlation_id: correlation_id.clone(),
                    short_url: format!("{}/{}", state.base_url, url.short_url),
                })
        })
        .collect();

    Ok((StatusCode::CREATED, Json(response)).into_response())
}
