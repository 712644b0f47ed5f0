mod common;

use axum::http::StatusCode;
use axum::http::{HeaderName, HeaderValue};
use std::sync::Arc;
use urlshort::infrastructure::persistence::MemoryUrlRepository;

fn x_real_ip(value: &'static str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-real-ip"),
        HeaderValue::from_static(value),
    )
}

#[tokio::test]
async fn test_stats_from_trusted_ip() {
    let state = common::create_test_state(
        Arc::new(MemoryUrlRepository::new()),
        Some("10.0.0.0/8"),
    );
    let server = common::create_test_server_with_state(state);

    server.post("/").text("https://example.com/").await;

    let (name, value) = x_real_ip("10.1.2.3");
    let response = server
        .get("/api/internal/stats")
        .add_header(name, value)
        .await;

    response.assert_status(StatusCode::OK);
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["urls"], 1);
    assert_eq!(body["users"], 1);
}

#[tokio::test]
async fn test_stats_from_untrusted_ip_is_forbidden() {
    let state = common::create_test_state(
        Arc::new(MemoryUrlRepository::new()),
        Some("10.0.0.0/8"),
    );
    let server = common::create_test_server_with_state(state);

    let (name, value) = x_real_ip("192.168.1.1");
    let response = server
        .get("/api/internal/stats")
        .add_header(name, value)
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_stats_without_configured_subnet_is_forbidden() {
    let server = common::create_test_server();

    let (name, value) = x_real_ip("10.1.2.3");
    let response = server
        .get("/api/internal/stats")
        .add_header(name, value)
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_stats_forwarded_for_fallback() {
    let state = common::create_test_state(
        Arc::new(MemoryUrlRepository::new()),
        Some("10.0.0.0/8"),
    );
    let server = common::create_test_server_with_state(state);

    let response = server
        .get("/api/internal/stats")
        .add_header(
            HeaderName::from_static("x-forwarded-for"),
            HeaderValue::from_static("10.9.9.9, 203.0.113.7"),
        )
        .await;

    response.assert_status(StatusCode::OK);
}

#[tokio::test]
async fn test_stats_counts_exclude_deleted_urls() {
    use urlshort::domain::repositories::UrlRepository;

    let repository = Arc::new(MemoryUrlRepository::new());
    repository
        .add("user-1", "aaaa1111", "https://a.example/")
        .await
        .unwrap();
    repository
        .add("user-2", "bbbb2222", "https://b.example/")
        .await
        .unwrap();
    repository
        .mark_deleted_batch("user-2", &["bbbb2222".to_string()])
        .await
        .unwrap();

    let state = common::create_test_state(repository, Some("10.0.0.0/8"));
    let server = common::create_test_server_with_state(state);

    let (name, value) = x_real_ip("10.1.2.3");
    let response = server
        .get("/api/internal/stats")
        .add_header(name, value)
        .await;

    let body = response.json::<serde_json::Value>();
    assert_eq!(body["urls"], 1);
    assert_eq!(body["users"], 2);
}
