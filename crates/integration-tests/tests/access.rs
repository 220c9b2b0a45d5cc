//! Accounts, bearer tokens, and health checks.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use platter_integration_tests::{FailPoint, TestContext};
use serde_json::json;

#[tokio::test]
async fn test_health_endpoints() {
    let ctx = TestContext::new();

    let live = ctx.get("/health", None).await;
    assert_eq!(live.status, StatusCode::OK);
    assert_eq!(live.body, json!("ok"));

    let ready = ctx.get("/health/ready", None).await;
    assert_eq!(ready.status, StatusCode::OK);
}

#[tokio::test]
async fn test_register_returns_user_and_token() {
    let ctx = TestContext::new();

    let response = ctx
        .post(
            "/api/users/register",
            None,
            json!({
                "name": "Nia",
                "email": "Nia@Example.com",
                "password": "correct horse battery",
                "address": "4 Oak Ave",
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert!(response.body["token"].is_string());
    assert_eq!(response.body["user"]["isAdmin"], json!(false));
    assert!(response.body["user"].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_register_ignores_admin_flag() {
    let ctx = TestContext::new();

    let response = ctx
        .post(
            "/api/users/register",
            None,
            json!({
                "name": "Mal",
                "email": "mal@example.com",
                "password": "correct horse battery",
                "isAdmin": true,
            }),
        )
        .await;
    assert_eq!(response.body["user"]["isAdmin"], json!(false));
}

#[tokio::test]
async fn test_register_validation() {
    let ctx = TestContext::new();

    let missing = ctx
        .post("/api/users/register", None, json!({ "name": "Nia" }))
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.message(), "Please enter all required fields");

    let bad_email = ctx
        .post(
            "/api/users/register",
            None,
            json!({ "name": "Nia", "email": "nope", "password": "correct horse battery" }),
        )
        .await;
    assert_eq!(bad_email.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_email.message(), "Please enter a valid email");

    ctx.register("Nia", "nia@example.com").await;
    let duplicate = ctx
        .post(
            "/api/users/register",
            None,
            json!({ "name": "Nia", "email": "nia@example.com", "password": "another password" }),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);
    assert_eq!(duplicate.message(), "User with this email already exists");
}

#[tokio::test]
async fn test_login() {
    let ctx = TestContext::new();
    ctx.register("Nia", "nia@example.com").await;

    let ok = ctx
        .post(
            "/api/users/login",
            None,
            json!({ "email": "nia@example.com", "password": "correct horse battery" }),
        )
        .await;
    assert_eq!(ok.status, StatusCode::OK);
    let token = ok.body["token"].as_str().unwrap();

    let me = ctx.get("/api/users/me", Some(token)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["name"], "Nia");

    let wrong = ctx
        .post(
            "/api/users/login",
            None,
            json!({ "email": "nia@example.com", "password": "wrong password" }),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.message(), "Invalid login credentials");

    let unknown = ctx
        .post(
            "/api/users/login",
            None,
            json!({ "email": "ghost@example.com", "password": "correct horse battery" }),
        )
        .await;
    assert_eq!(unknown.message(), "Invalid login credentials");
}

#[tokio::test]
async fn test_google_login_creates_then_reuses_account() {
    let ctx = TestContext::new();

    let first = ctx
        .post(
            "/api/users/google-login",
            None,
            json!({ "tokenId": "valid:gia@example.com" }),
        )
        .await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["user"]["name"], "Google User");

    let second = ctx
        .post(
            "/api/users/google-login",
            None,
            json!({ "tokenId": "valid:gia@example.com" }),
        )
        .await;
    assert_eq!(second.body["user"]["id"], first.body["user"]["id"]);
}

#[tokio::test]
async fn test_google_login_rejects_bad_token() {
    let ctx = TestContext::new();

    let response = ctx
        .post("/api/users/google-login", None, json!({ "tokenId": "forged" }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), "Google login failed");
}

#[tokio::test]
async fn test_gate_rejects_missing_and_bad_tokens() {
    let ctx = TestContext::new();

    let missing = ctx.get("/api/cart", None).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing.message(), "Please authenticate.");

    let garbage = ctx.get("/api/cart", Some("not.a.token")).await;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_gate_rejects_tokens_for_deleted_users() {
    let ctx = TestContext::new();
    let token = ctx
        .tokens
        .issue(platter_core::UserId::new(4242))
        .unwrap();

    let response = ctx.get("/api/users/me", Some(&token)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_gate_store_failure_is_server_error() {
    let ctx = TestContext::new();
    let token = ctx.register("Nia", "nia@example.com").await;

    ctx.store.fail_on(FailPoint::LoadUser);
    let response = ctx.get("/api/users/me", Some(&token)).await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_admin_routes_reject_customers() {
    let ctx = TestContext::new();
    let customer = ctx.register("Nia", "nia@example.com").await;

    let response = ctx.get("/api/admin/orders", Some(&customer)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.message(), "Please authenticate as an admin.");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let ctx = TestContext::new();

    let response = ctx
        .send(
            axum::http::Method::POST,
            "/api/users/login",
            None,
            Some(json!("just a string")),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}
