mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::http::header::LOCATION;
use urlshort::infrastructure::persistence::{FileRepositoryConfig, FileUrlRepository};

#[tokio::test]
async fn test_file_backed_service_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("urls.jsonl");

    // First instance: shorten a URL, then shut the stack down cleanly.
    let repository = Arc::new(
        FileUrlRepository::new(&path, FileRepositoryConfig::default())
            .await
            .unwrap(),
    );
    let state = common::create_test_state(repository, None);
    let server = common::create_test_server_with_state(state.clone());

    let shortened = server.post("/").text("https://example.com/").await;
    shortened.assert_status(StatusCode::CREATED);
    let short_id = common::short_id_of(&shortened.text()).to_string();

    state.url_service.shutdown().await.unwrap();

    // Second instance on the same file answers the same lookup.
    let repository = Arc::new(
        FileUrlRepository::new(&path, FileRepositoryConfig::default())
            .await
            .unwrap(),
    );
    let state = common::create_test_state(repository, None);
    let server = common::create_test_server_with_state(state.clone());

    let response = server.get(&format!("/{short_id}")).await;
    response.assert_status(StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.header(LOCATION), "https://example.com/");

    state.url_service.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_file_backed_delete_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("urls.jsonl");

    let repository = Arc::new(
        FileUrlRepository::new(&path, FileRepositoryConfig::default())
            .await
            .unwrap(),
    );
    let state = common::create_test_state(repository, None);
    let server = common::create_test_server_with_state(state.clone());

    let shortened = server.post("/").text("https://example.com/").await;
    let short_id = common::short_id_of(&shortened.text()).to_string();

    server
        .delete("/api/user/urls")
        .json(&serde_json::json!([short_id.clone()]))
        .await
        .assert_status(StatusCode::ACCEPTED);

    // Wait for the worker flush, then drain and close.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    state.url_service.shutdown().await.unwrap();

    let repository = Arc::new(
        FileUrlRepository::new(&path, FileRepositoryConfig::default())
            .await
            .unwrap(),
    );
    let state = common::create_test_state(repository, None);
    let server = common::create_test_server_with_state(state.clone());

    let response = server.get(&format!("/{short_id}")).await;
    response.assert_status(StatusCode::GONE);

    state.url_service.shutdown().await.unwrap();
}
