//! DTOs for the shorten endpoints.

use serde::{Deserialize, Serialize};

/// Request body of `POST /api/shorten`.
#[derive(Debug, Deserialize)]
pub struct ShortenRequest {
    pub url: String,
}

/// Response body of `POST /api/shorten`.
#[derive(Debug, Serialize)]
pub struct ShortenResponse {
    pub result: String,
}

/// One item of the `POST /api/shorten/batch` request.
#[derive(Debug, Deserialize)]
pub struct ShortenBatchRequestItem {
    #[serde(default)]
    pub correlation_id: String,
    #[serde(default)]
    pub original_url: String,
}

/// One item of the `POST /api/shorten/batch` response.
#[derive(Debug, Serialize)]
pub struct ShortenBatchResponseItem {
    pub correlation_id: String,
    pub short_url: String,
}
