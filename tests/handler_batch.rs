mod common;

use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_batch_shorten_preserves_correlation_ids() {
    let server = common::create_test_server();

    let response = server
        .post("/api/shorten/batch")
        .json(&json!([
            { "correlation_id": "1", "original_url": "https://a.example/" },
            { "correlation_id": "2", "original_url": "https://b.example/" }
        ]))
        .await;

    response.assert_status(StatusCode::CREATED);
    let items = response.json::<serde_json::Value>();
    let items = items.as_array().unwrap();
    assert_eq!(items.len(), 2);

    assert_eq!(items[0]["correlation_id"], "1");
    assert_eq!(items[1]["correlation_id"], "2");

    let first = items[0]["short_url"].as_str().unwrap();
    let second = items[1]["short_url"].as_str().unwrap();
    common::assert_short_link(first);
    common::assert_short_link(second);
    assert_ne!(first, second);
}

#[tokio::test]
async fn test_batch_shorten_drops_incomplete_items() {
    let server = common::create_test_server();

    let response = server
        .post("/api/shorten/batch")
        .json(&json!([
            { "correlation_id": "", "original_url": "https://a.example/" },
            { "correlation_id": "2", "original_url": "" },
            { "correlation_id": "3", "original_url": "https://c.example/" }
        ]))
        .await;

    response.assert_status(StatusCode::CREATED);
    let items = response.json::<serde_json::Value>();
    let items = items.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["correlation_id"], "3");
}

#[tokio::test]
async fn test_batch_shorten_reuses_existing_mapping() {
    let server = common::create_test_server();

    let shortened = server.post("/").text("https://a.example/").await;
    let existing = shortened.text();

    let response = server
        .post("/api/shorten/batch")
        .json(&json!([
            { "correlation_id": "1", "original_url": "https://a.example/" }
        ]))
        .await;

    response.assert_status(StatusCode::CREATED);
    let items = response.json::<serde_json::Value>();
    assert_eq!(items[0]["short_url"].as_str().unwrap(), existing);
}

#[tokio::test]
async fn test_batch_shorten_empty_body_is_bad_request() {
    let server = common::create_test_server();

    let response = server.post("/api/shorten/batch").json(&json!([])).await;

    response.assert_status(StatusCode::BAD_REQUEST);
}
