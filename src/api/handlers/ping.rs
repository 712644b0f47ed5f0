//! Handler for the storage health check.

use axum::{extract::State, http::StatusCode, response::Response};
use serde_json::json;

use crate::api::middleware::auth::UserId;
use crate::error::AppError;
use crate::state::AppState;

use super::json_response;

/// Reports storage liveness.
///
/// # Endpoint
///
/// `GET /ping`
pub async fn ping_handler(
    State(state): State<AppState>,
    _user_id: UserId,
) -> Result<Response, AppError> {
    state.url_service.ping().await.map_err(|e| {
        tracing::error!(error = %e, "storage ping failed");
        AppError::internal("Failed to ping storage", json!({}))
    })?;

    Ok(json_response(StatusCode::OK, json!("storage is alive")))
}
