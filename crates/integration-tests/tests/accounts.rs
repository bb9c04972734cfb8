//! Sign-up, login and the shared error envelope.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::{Value, json};

use cartwheel_integration_tests::{TestServer, json_body};

#[tokio::test]
async fn test_sign_up_then_login() {
    let server = TestServer::spawn().await;

    let resp = server.sign_up("a", "a@x", "secret").await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = json_body(resp).await;
    assert_eq!(body["status"], json!(true));
    assert_eq!(body["message"], json!("Account created successfully"));
    assert_eq!(body["data"], Value::Null);

    let resp = server.request_token("a@x", "secret").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));

    let resp = server.request_token("a@x", "wrong").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_email_and_wrong_password_look_the_same() {
    let server = TestServer::spawn().await;
    server.sign_up("a", "a@x", "secret").await;

    let wrong_password = json_body(server.request_token("a@x", "wrong").await).await;
    let unknown_email = json_body(server.request_token("nobody@x", "secret").await).await;

    assert_eq!(wrong_password["status"], json!(401));
    assert_eq!(wrong_password["message"], unknown_email["message"]);
    assert_eq!(
        wrong_password["message"],
        json!(server.config.messages.invalid_credentials)
    );
}

#[tokio::test]
async fn test_duplicate_email_is_a_conflict() {
    let server = TestServer::spawn().await;

    let resp = server.sign_up("a", "a@x", "secret").await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = server.sign_up("b", "a@x", "secret").await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body = json_body(resp).await;
    assert_eq!(body["error"], json!("Conflict"));
    assert_eq!(body["message"], json!("User already exists with email: a@x"));
}

#[tokio::test]
async fn test_password_length_boundary() {
    let server = TestServer::spawn().await;

    let resp = server.sign_up("a", "a@x", "12345").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = server.sign_up("a", "a@x", "123456").await;
    assert_eq!(resp.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_null_sign_up_body_is_rejected() {
    let server = TestServer::spawn().await;

    let resp = server
        .post("/account")
        .header("content-type", "application/json")
        .body("null")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert_eq!(
        body["message"],
        json!(server.config.messages.account_create_null)
    );
}

#[tokio::test]
async fn test_error_envelope_shape() {
    let server = TestServer::spawn().await;

    let resp = server
        .post("/account")
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert_eq!(body["status"], json!(400));
    assert_eq!(body["error"], json!("Bad Request"));
    assert_eq!(body["path"], json!("/account"));
    assert!(body["timestamp"].is_string());
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_request_id_is_echoed_or_generated() {
    let server = TestServer::spawn().await;

    let resp = server
        .get("/health")
        .header("x-request-id", "req-123")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["x-request-id"], "req-123");

    let resp = server.get("/health").send().await.unwrap();
    assert!(resp.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_readiness_and_unknown_routes() {
    let server = TestServer::spawn().await;

    let resp = server.get("/health/ready").send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = server.get("/nowhere").send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = json_body(resp).await;
    assert_eq!(body["path"], json!("/nowhere"));
}
