//! Charging the cart through the payment processor.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use platter_api::services::stripe::PaymentIntentStatus;
use platter_integration_tests::{ChargeScript, TestContext};
use serde_json::json;

const RETURN_URL: &str = "https://shop.platter.test/checkout/complete";

async fn customer_with_cart(ctx: &TestContext, price: f64, quantity: i64) -> String {
    let admin = ctx.admin().await;
    let restaurant = ctx.restaurant(&admin, "Bakery").await;
    let item = ctx.menu_item(&admin, restaurant, "Croissant", price).await;
    let user = ctx.register("Pat", "pat@example.com").await;
    ctx.add_to_cart(&user, item, quantity).await;
    user
}

async fn pay(ctx: &TestContext, token: &str) -> platter_integration_tests::TestResponse {
    ctx.post(
        "/api/payments",
        Some(token),
        json!({ "paymentMethodId": "pm_card_visa", "return_url": RETURN_URL }),
    )
    .await
}

#[tokio::test]
async fn test_successful_charge() {
    let ctx = TestContext::new();
    let user = customer_with_cart(&ctx, 10.0, 2).await;

    let response = pay(&ctx, &user).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({ "success": true }));

    let charges = ctx.gateway.charges();
    assert_eq!(charges.len(), 1);
    assert_eq!(charges[0].amount, 2000);
    assert_eq!(charges[0].currency, "usd");
    assert_eq!(charges[0].payment_method, "pm_card_visa");
    assert_eq!(charges[0].return_url.as_str(), RETURN_URL);
}

#[tokio::test]
async fn test_amount_is_exact_in_cents() {
    let ctx = TestContext::new();
    let user = customer_with_cart(&ctx, 19.99, 3).await;

    pay(&ctx, &user).await;
    assert_eq!(ctx.gateway.charges()[0].amount, 5997);
}

#[tokio::test]
async fn test_payment_does_not_touch_cart() {
    let ctx = TestContext::new();
    let user = customer_with_cart(&ctx, 4.0, 1).await;

    pay(&ctx, &user).await;
    let cart = ctx.get("/api/cart", Some(&user)).await;
    assert_eq!(cart.body.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_requires_action_returns_client_secret() {
    let ctx = TestContext::new();
    let user = customer_with_cart(&ctx, 8.0, 1).await;
    ctx.gateway.respond_with(ChargeScript::Status(
        PaymentIntentStatus::RequiresAction,
        Some("pi_test_secret_abc".to_owned()),
    ));

    let response = pay(&ctx, &user).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body,
        json!({
            "success": false,
            "requires_action": true,
            "payment_intent_client_secret": "pi_test_secret_abc",
        })
    );
}

#[tokio::test]
async fn test_other_status_is_a_failed_payment() {
    let ctx = TestContext::new();
    let user = customer_with_cart(&ctx, 8.0, 1).await;
    ctx.gateway.respond_with(ChargeScript::Status(
        PaymentIntentStatus::RequiresPaymentMethod,
        None,
    ));

    let response = pay(&ctx, &user).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["success"], json!(false));
    assert!(response.message().contains("requires_payment_method"));
}

#[tokio::test]
async fn test_decline_message_is_passed_through() {
    let ctx = TestContext::new();
    let user = customer_with_cart(&ctx, 8.0, 1).await;
    ctx.gateway
        .respond_with(ChargeScript::Decline("Your card was declined.".to_owned()));

    let response = pay(&ctx, &user).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.body,
        json!({ "success": false, "message": "Your card was declined." })
    );
}

#[tokio::test]
async fn test_empty_cart_is_not_charged() {
    let ctx = TestContext::new();
    let user = ctx.register("Pat", "pat@example.com").await;

    let response = pay(&ctx, &user).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(ctx.gateway.charges().is_empty());
}

#[tokio::test]
async fn test_missing_payment_method() {
    let ctx = TestContext::new();
    let user = customer_with_cart(&ctx, 8.0, 1).await;

    let response = ctx
        .post("/api/payments", Some(&user), json!({ "return_url": RETURN_URL }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), "Payment method ID is required");
    assert!(ctx.gateway.charges().is_empty());
}

#[tokio::test]
async fn test_payment_requires_login() {
    let ctx = TestContext::new();

    let response = ctx
        .post("/api/payments", None, json!({ "paymentMethodId": "pm_card_visa" }))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}
