//! HTTP request handlers, one module per endpoint.

mod api_shorten;
mod batch_shorten;
mod ping;
mod redirect;
mod shorten;
mod stats;
mod user_urls;
mod user_urls_delete;

pub use api_shorten::api_shorten_handler;
pub use batch_shorten::batch_shorten_handler;
pub use ping::ping_handler;
pub use redirect::redirect_handler;
pub use shorten::shorten_handler;
pub use stats::stats_handler;
pub use user_urls::user_urls_handler;
pub use user_urls_delete::user_urls_delete_handler;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;

/// Success envelope matching the error envelope shape.
#[derive(Serialize)]
struct Envelope {
    status: u16,
    message: String,
    data: Value,
}

/// Builds a `{status, message, data}` JSON response.
fn json_response(status: StatusCode, data: Value) -> Response {
    let body = Envelope {
        status: status.as_u16(),
        message: status
            .canonical_reason()
            .unwrap_or_default()
            .to_string(),
        data,
    };
    (status, Json(body)).into_response()
}
