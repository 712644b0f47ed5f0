mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::http::header::LOCATION;
use urlshort::infrastructure::persistence::MemoryUrlRepository;

#[tokio::test]
async fn test_redirect_to_original_url() {
    let server = common::create_test_server();

    let shortened = server.post("/").text("https://example.com/").await;
    let short_id = common::short_id_of(&shortened.text()).to_string();

    let response = server.get(&format!("/{short_id}")).await;

    response.assert_status(StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.header(LOCATION), "https://example.com/");
    assert!(response.text().is_empty());
}

#[tokio::test]
async fn test_redirect_unknown_id_is_not_found() {
    let server = common::create_test_server();

    let response = server.get("/missing1").await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_redirect_deleted_id_is_gone() {
    let repository = Arc::new(MemoryUrlRepository::new());
    let state = common::create_test_state(repository.clone(), None);
    let server = common::create_test_server_with_state(state);

    use urlshort::domain::repositories::UrlRepository;
    repository
        .add("user-1", "abCD1234", "https://example.com/")
        .await
        .unwrap();
    repository
        .mark_deleted_batch("user-1", &["abCD1234".to_string()])
        .await
        .unwrap();

    let response = server.get("/abCD1234").await;

    response.assert_status(StatusCode::GONE);
}

#[tokio::test]
async fn test_ping_reports_alive() {
    let server = common::create_test_server();

    let response = server.get("/ping").await;

    response.assert_status(StatusCode::OK);
}
