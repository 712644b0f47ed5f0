#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum_test::TestServer;
use urlshort::application::services::UrlService;
use urlshort::domain::delete_worker::{DeleteWorker, DeleteWorkerConfig};
use urlshort::domain::repositories::UrlRepository;
use urlshort::infrastructure::persistence::MemoryUrlRepository;
use urlshort::routes::app_router;
use urlshort::state::AppState;

pub const BASE_URL: &str = "http://localhost:8080";
pub const AUTH_SECRET: &str = "test-secret";

/// Builds application state over the given repository, with a fast-flushing
/// delete worker so deletion tests settle quickly.
pub fn create_test_state(
    repository: Arc<dyn UrlRepository>,
    trusted_subnet: Option<&str>,
) -> AppState {
    let worker = Arc::new(DeleteWorker::new(
        repository.clone(),
        DeleteWorkerConfig {
            flush_interval: Duration::from_millis(50),
            ..Default::default()
        },
    ));

    AppState {
        url_service: Arc::new(UrlService::new(repository, Some(worker))),
        base_url: BASE_URL.to_string(),
        auth_secret: AUTH_SECRET.to_string(),
        trusted_subnet: trusted_subnet.map(|subnet| subnet.parse().unwrap()),
    }
}

/// A test server over the full router and the given state, with cookie
/// persistence so the identity survives across requests.
pub fn create_test_server_with_state(state: AppState) -> TestServer {
    let mut server = TestServer::new(app_router(state)).unwrap();
    server.save_cookies();
    server
}

/// A test server over an in-memory backend.
pub fn create_test_server() -> TestServer {
    create_test_server_with_state(create_test_state(Arc::new(MemoryUrlRepository::new()), None))
}

/// Extracts the short identifier from a `<base>/<short>` body.
pub fn short_id_of(link: &str) -> &str {
    link.rsplit('/').next().unwrap()
}

/// Asserts that `link` looks like `<BASE_URL>/<8 chars of [A-Za-z0-9]>`.
pub fn assert_short_link(link: &str) {
    let prefix = format!("{BASE_URL}/");
    assert!(link.starts_with(&prefix), "unexpected link: {link}");
    let id = &link[prefix.len()..];
    assert_eq!(id.len(), 8, "unexpected id length in: {link}");
    assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
}
