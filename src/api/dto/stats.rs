//! DTOs for the internal statistics endpoint.

use serde::Serialize;

/// Response body of `GET /api/internal/stats`.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub urls: i64,
    pub users: i64,
}
