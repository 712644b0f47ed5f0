//! Application state shared across HTTP handlers.

use std::sync::Arc;

use ipnetwork::IpNetwork;

use crate::application::services::UrlService;

/// Shared application state injected into HTTP handlers.
///
/// Cheap to clone; the service is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub url_service: Arc<UrlService>,
    /// Base of every shortened link, e.g. `http://localhost:8080`.
    pub base_url: String,
    /// HS256 secret for the identity cookie.
    pub auth_secret: String,
    /// CIDR allowed to query the internal stats endpoint.
    pub trusted_subnet: Option<IpNetwork>,
}
