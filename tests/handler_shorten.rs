mod common;

use axum::http::StatusCode;
use axum::http::header::{CONTENT_TYPE, SET_COOKIE};
use serde_json::json;

#[tokio::test]
async fn test_shorten_returns_created_with_short_link() {
    let server = common::create_test_server();

    let response = server.post("/").text("https://example.com/").await;

    response.assert_status(StatusCode::CREATED);
    let content_type = response.header(CONTENT_TYPE);
    assert!(content_type.to_str().unwrap().starts_with("text/plain"));
    common::assert_short_link(&response.text());
}

#[tokio::test]
async fn test_shorten_sets_auth_cookie_on_first_request() {
    let server = common::create_test_server();

    let response = server.post("/").text("https://example.com/").await;

    response.assert_status(StatusCode::CREATED);
    let set_cookie = response.header(SET_COOKIE);
    assert!(set_cookie.to_str().unwrap().starts_with("Auth="));
}

#[tokio::test]
async fn test_shorten_same_url_twice_conflicts_with_same_body() {
    let server = common::create_test_server();

    let first = server.post("/").text("https://example.com/").await;
    first.assert_status(StatusCode::CREATED);

    let second = server.post("/").text("https://example.com/").await;
    second.assert_status(StatusCode::CONFLICT);
    assert_eq!(first.text(), second.text());
}

#[tokio::test]
async fn test_shorten_empty_body_is_bad_request() {
    let server = common::create_test_server();

    let response = server.post("/").text("").await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_api_shorten_returns_result_json() {
    let server = common::create_test_server();

    let response = server
        .post("/api/shorten")
        .json(&json!({ "url": "https://example.com/" }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body = response.json::<serde_json::Value>();
    common::assert_short_link(body["result"].as_str().unwrap());
}

#[tokio::test]
async fn test_api_shorten_duplicate_conflicts_with_existing_link() {
    let server = common::create_test_server();

    let first = server
        .post("/api/shorten")
        .json(&json!({ "url": "https://example.com/" }))
        .await;
    let first_link = first.json::<serde_json::Value>()["result"]
        .as_str()
        .unwrap()
        .to_string();

    let second = server
        .post("/api/shorten")
        .json(&json!({ "url": "https://example.com/" }))
        .await;

    second.assert_status(StatusCode::CONFLICT);
    let second_link = second.json::<serde_json::Value>()["result"]
        .as_str()
        .unwrap()
        .to_string();
    assert_eq!(first_link, second_link);
}

#[tokio::test]
async fn test_api_shorten_empty_url_is_bad_request() {
    let server = common::create_test_server();

    let response = server.post("/api/shorten").json(&json!({ "url": "" })).await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_api_shorten_invalid_json_is_bad_request() {
    let server = common::create_test_server();

    let response = server
        .post("/api/shorten")
        .text("not json")
        .content_type("application/json")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}
