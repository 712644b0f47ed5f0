//! DTOs for the per-user URL listing.

use serde::Serialize;

/// One item of the `GET /api/user/urls` response.
#[derive(Debug, Serialize)]
pub struct UserUrlItem {
    pub short_url: String,
    pub original_url: String,
}
