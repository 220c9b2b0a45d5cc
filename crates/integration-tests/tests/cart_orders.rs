//! Cart merging, both order-creation paths, and the order lifecycle.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use platter_integration_tests::{FailPoint, TestContext};
use serde_json::json;

struct Menu {
    admin: String,
    pizza: i64,
    salad: i64,
}

async fn menu(ctx: &TestContext) -> Menu {
    let admin = ctx.admin().await;
    let restaurant = ctx.restaurant(&admin, "Trattoria").await;
    let pizza = ctx.menu_item(&admin, restaurant, "Pizza", 10.0).await;
    let salad = ctx.menu_item(&admin, restaurant, "Salad", 5.0).await;
    Menu { admin, pizza, salad }
}

#[tokio::test]
async fn test_adding_same_item_merges_quantities() {
    let ctx = TestContext::new();
    let menu = menu(&ctx).await;
    let user = ctx.register("Uma", "uma@example.com").await;

    let first = ctx.add_to_cart(&user, menu.pizza, 1).await;
    assert_eq!(first.status, StatusCode::CREATED);
    let second = ctx.add_to_cart(&user, menu.pizza, 2).await;
    assert_eq!(second.body["quantity"], json!(3));
    assert_eq!(first.body["id"], second.body["id"]);

    let cart = ctx.get("/api/cart", Some(&user)).await;
    assert_eq!(cart.body.as_array().map(Vec::len), Some(1));
    assert_eq!(cart.body[0]["menuItem"]["name"], "Pizza");
}

#[tokio::test]
async fn test_add_defaults_quantity_to_one() {
    let ctx = TestContext::new();
    let menu = menu(&ctx).await;
    let user = ctx.register("Uma", "uma@example.com").await;

    let response = ctx
        .post("/api/cart", Some(&user), json!({ "menuItemId": menu.salad }))
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["quantity"], json!(1));
}

#[tokio::test]
async fn test_cart_rejects_bad_input() {
    let ctx = TestContext::new();
    let menu = menu(&ctx).await;
    let user = ctx.register("Uma", "uma@example.com").await;

    let zero = ctx.add_to_cart(&user, menu.pizza, 0).await;
    assert_eq!(zero.status, StatusCode::BAD_REQUEST);
    assert_eq!(zero.message(), "Quantity must be at least 1");

    let unknown = ctx.add_to_cart(&user, 9999, 1).await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    assert_eq!(unknown.message(), "Menu item not found");
}

#[tokio::test]
async fn test_cart_rows_are_private() {
    let ctx = TestContext::new();
    let menu = menu(&ctx).await;
    let owner = ctx.register("Owen", "owen@example.com").await;
    let other = ctx.register("Otto", "otto@example.com").await;

    let row = ctx.add_to_cart(&owner, menu.pizza, 1).await;
    let id = row.body["id"].as_i64().unwrap();

    let update = ctx
        .put(&format!("/api/cart/{id}"), Some(&other), json!({ "quantity": 5 }))
        .await;
    assert_eq!(update.status, StatusCode::NOT_FOUND);
    let remove = ctx.delete(&format!("/api/cart/{id}"), Some(&other)).await;
    assert_eq!(remove.status, StatusCode::NOT_FOUND);

    let removed = ctx.delete(&format!("/api/cart/{id}"), Some(&owner)).await;
    assert_eq!(removed.status, StatusCode::OK);
    assert_eq!(removed.message(), "Cart item removed");
}

#[tokio::test]
async fn test_checkout_totals_cart_and_clears_it() {
    let ctx = TestContext::new();
    let menu = menu(&ctx).await;
    let user = ctx.register("Uma", "uma@example.com").await;
    ctx.add_to_cart(&user, menu.pizza, 2).await;
    ctx.add_to_cart(&user, menu.salad, 1).await;

    let order = ctx
        .post("/api/orders", Some(&user), json!({ "address": "12 Elm St" }))
        .await;
    assert_eq!(order.status, StatusCode::CREATED);
    assert_eq!(order.body["total"], json!(25.0));
    assert_eq!(order.body["status"], "Pending");
    assert_eq!(order.body["address"], "12 Elm St");
    assert_eq!(order.body["items"].as_array().map(Vec::len), Some(2));

    let cart = ctx.get("/api/cart", Some(&user)).await;
    assert_eq!(cart.body, json!([]));
}

#[tokio::test]
async fn test_checkout_without_body_uses_cart() {
    let ctx = TestContext::new();
    let menu = menu(&ctx).await;
    let user = ctx.register("Uma", "uma@example.com").await;
    ctx.add_to_cart(&user, menu.salad, 3).await;

    let order = ctx
        .send(axum::http::Method::POST, "/api/orders", Some(&user), None)
        .await;
    assert_eq!(order.status, StatusCode::CREATED);
    assert_eq!(order.body["total"], json!(15.0));
}

#[tokio::test]
async fn test_checkout_empty_cart() {
    let ctx = TestContext::new();
    let user = ctx.register("Uma", "uma@example.com").await;

    let response = ctx.post("/api/orders", Some(&user), json!({})).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), "Cart is empty");
}

#[tokio::test]
async fn test_checkout_snapshots_prices() {
    let ctx = TestContext::new();
    let menu = menu(&ctx).await;
    let user = ctx.register("Uma", "uma@example.com").await;
    ctx.add_to_cart(&user, menu.pizza, 1).await;
    let order = ctx.post("/api/orders", Some(&user), json!({})).await;
    let order_id = order.body["id"].as_i64().unwrap();

    let restaurant = ctx.get("/api/menu", None).await.body[0]["restaurant"].as_i64().unwrap();
    ctx.put(
        &format!("/api/restaurants/{restaurant}/menu/{}", menu.pizza),
        Some(&menu.admin),
        json!({ "price": 99.0 }),
    )
    .await;

    let stored = ctx.get(&format!("/api/orders/{order_id}"), Some(&user)).await;
    assert_eq!(stored.body["total"], json!(10.0));
    assert_eq!(stored.body["items"][0]["price"], json!(10.0));
}

#[tokio::test]
async fn test_failed_cart_clear_keeps_order_and_cart() {
    let ctx = TestContext::new();
    let menu = menu(&ctx).await;
    let user = ctx.register("Uma", "uma@example.com").await;
    ctx.add_to_cart(&user, menu.pizza, 1).await;

    ctx.store.fail_on(FailPoint::ClearCart);
    let response = ctx.post("/api/orders", Some(&user), json!({})).await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    ctx.store.heal(FailPoint::ClearCart);

    let orders = ctx.get("/api/orders", Some(&user)).await;
    assert_eq!(orders.body.as_array().map(Vec::len), Some(1));
    let cart = ctx.get("/api/cart", Some(&user)).await;
    assert_eq!(cart.body.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_direct_submission_ignores_cart() {
    let ctx = TestContext::new();
    let menu = menu(&ctx).await;
    let user = ctx.register("Uma", "uma@example.com").await;
    ctx.add_to_cart(&user, menu.pizza, 4).await;

    let order = ctx
        .post(
            "/api/orders",
            Some(&user),
            json!({
                "items": [{ "menuItem": menu.salad, "quantity": 2, "price": 1.5 }],
                "address": "Dock 9",
            }),
        )
        .await;
    assert_eq!(order.status, StatusCode::CREATED);
    // Client-supplied prices are trusted on this path.
    assert_eq!(order.body["total"], json!(3.0));

    let cart = ctx.get("/api/cart", Some(&user)).await;
    assert_eq!(cart.body[0]["quantity"], json!(4));
}

#[tokio::test]
async fn test_direct_submission_requires_items_and_address() {
    let ctx = TestContext::new();
    let user = ctx.register("Uma", "uma@example.com").await;

    let response = ctx
        .post("/api/orders", Some(&user), json!({ "items": [] }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), "Please include all required fields");
}

#[tokio::test]
async fn test_direct_submission_rejects_unstorable_prices() {
    let ctx = TestContext::new();
    let menu = menu(&ctx).await;
    let user = ctx.register("Uma", "uma@example.com").await;

    let overflow = ctx
        .post(
            "/api/orders",
            Some(&user),
            json!({
                "items": [{ "menuItem": menu.pizza, "quantity": 2, "price": 5e28 }],
                "address": "x",
            }),
        )
        .await;
    assert_eq!(overflow.status, StatusCode::BAD_REQUEST);
    assert_eq!(overflow.message(), "Order total is too large");

    let sub_cent = ctx
        .post(
            "/api/orders",
            Some(&user),
            json!({
                "items": [{ "menuItem": menu.salad, "quantity": 3, "price": 0.125 }],
                "address": "x",
            }),
        )
        .await;
    assert_eq!(sub_cent.status, StatusCode::BAD_REQUEST);
    assert_eq!(sub_cent.message(), "Price 0.125 has more than two decimal places");

    let orders = ctx.get("/api/orders", Some(&user)).await;
    assert_eq!(orders.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_no_orders_is_not_found() {
    let ctx = TestContext::new();
    let user = ctx.register("Uma", "uma@example.com").await;

    let response = ctx.get("/api/orders", Some(&user)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.message(), "No orders found for this user");
}

#[tokio::test]
async fn test_cancel_only_from_pending() {
    let ctx = TestContext::new();
    let menu = menu(&ctx).await;
    let user = ctx.register("Uma", "uma@example.com").await;
    ctx.add_to_cart(&user, menu.pizza, 1).await;
    let order = ctx.post("/api/orders", Some(&user), json!({})).await;
    let id = order.body["id"].as_i64().unwrap();

    let cancelled = ctx.delete(&format!("/api/orders/{id}"), Some(&user)).await;
    assert_eq!(cancelled.status, StatusCode::OK);
    assert_eq!(cancelled.message(), "Order cancelled successfully");

    let again = ctx.delete(&format!("/api/orders/{id}"), Some(&user)).await;
    assert_eq!(again.status, StatusCode::BAD_REQUEST);
    assert_eq!(again.message(), "Cannot cancel order that is not pending");
}

#[tokio::test]
async fn test_cancel_after_status_change_is_rejected() {
    let ctx = TestContext::new();
    let menu = menu(&ctx).await;
    let user = ctx.register("Uma", "uma@example.com").await;
    ctx.add_to_cart(&user, menu.pizza, 1).await;
    let id = ctx.post("/api/orders", Some(&user), json!({})).await.body["id"]
        .as_i64()
        .unwrap();

    let updated = ctx
        .put(
            &format!("/api/admin/orders/{id}"),
            Some(&menu.admin),
            json!({ "status": "Out for delivery" }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["status"], "Out for delivery");

    let response = ctx.delete(&format!("/api/orders/{id}"), Some(&user)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_other_users_orders_are_invisible() {
    let ctx = TestContext::new();
    let menu = menu(&ctx).await;
    let owner = ctx.register("Owen", "owen@example.com").await;
    let other = ctx.register("Otto", "otto@example.com").await;
    ctx.add_to_cart(&owner, menu.pizza, 1).await;
    let id = ctx.post("/api/orders", Some(&owner), json!({})).await.body["id"]
        .as_i64()
        .unwrap();

    let show = ctx.get(&format!("/api/orders/{id}"), Some(&other)).await;
    assert_eq!(show.status, StatusCode::NOT_FOUND);
    let cancel = ctx.delete(&format!("/api/orders/{id}"), Some(&other)).await;
    assert_eq!(cancel.status, StatusCode::NOT_FOUND);

    // Administrators may cancel anyone's pending order.
    let admin_cancel = ctx.delete(&format!("/api/orders/{id}"), Some(&menu.admin)).await;
    assert_eq!(admin_cancel.status, StatusCode::OK);
}

#[tokio::test]
async fn test_admin_lists_and_deletes_orders() {
    let ctx = TestContext::new();
    let menu = menu(&ctx).await;
    let user = ctx.register("Uma", "uma@example.com").await;
    ctx.add_to_cart(&user, menu.pizza, 1).await;
    let id = ctx.post("/api/orders", Some(&user), json!({})).await.body["id"]
        .as_i64()
        .unwrap();

    let all = ctx.get("/api/orders/admin/all", Some(&menu.admin)).await;
    assert_eq!(all.status, StatusCode::OK);
    assert_eq!(all.body[0]["user"]["email"], "uma@example.com");

    let blank = ctx
        .put(&format!("/api/orders/{id}"), Some(&menu.admin), json!({ "status": " " }))
        .await;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);
    assert_eq!(blank.message(), "Please include a status");

    let deleted = ctx.delete(&format!("/api/admin/orders/{id}"), Some(&menu.admin)).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.message(), "Order deleted successfully");

    let missing = ctx.delete(&format!("/api/admin/orders/{id}"), Some(&menu.admin)).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}
