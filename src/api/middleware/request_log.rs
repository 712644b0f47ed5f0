//! Structured access logging.

use axum::{extract::Request, middleware::Next, response::Response};
use http_body::Body as _;
use std::time::Instant;

/// Emits one structured record per request: method, uri, status, duration,
/// and response size (0 when the body length is not known up front, e.g.
/// compressed streams).
pub async fn layer(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();

    let response = next.run(req).await;

    let size = response.body().size_hint().exact().unwrap_or(0);
    tracing::info!(
        method = %method,
        uri = %uri,
        status = response.status().as_u16(),
        duration_ms = start.elapsed().as_millis() as u64,
        size,
        "request completed"
    );

    response
}
