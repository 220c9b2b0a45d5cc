//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! All routes below are nested under `/api`.
//!
//! ```text
//! # Users
//! POST   /users/register                  - Register, returns {user, token}
//! POST   /users/login                     - Password login
//! POST   /users/google-login              - Google ID token login
//! GET    /users/me                        - Current user (user)
//!
//! # Restaurants
//! GET    /restaurants                     - List restaurants
//! POST   /restaurants                     - Create (admin)
//! GET    /restaurants/{id}                - Show
//! PUT    /restaurants/{id}                - Update (admin)
//! DELETE /restaurants/{id}                - Delete with its menu (admin)
//! GET    /restaurants/{id}/menu           - Restaurant menu
//! POST   /restaurants/{id}/menu           - Add menu item (admin)
//! PUT    /restaurants/{id}/menu/{item_id} - Update menu item (admin)
//! DELETE /restaurants/{id}/menu/{item_id} - Delete menu item (admin)
//!
//! # Menu
//! GET    /menu                            - Every menu item
//! POST   /menu/{id}/rate                  - Rate 1-5 (user)
//!
//! # Cart (user)
//! GET    /cart                            - Cart rows with menu items
//! POST   /cart                            - Add or merge a row
//! PUT    /cart/{id}                       - Set quantity
//! DELETE /cart/{id}                       - Remove row
//!
//! # Orders
//! POST   /orders                          - Checkout cart or submit lines (user)
//! GET    /orders                          - Own orders, newest first (user)
//! GET    /orders/admin/all                - Every order (admin)
//! GET    /orders/{id}                     - Own order (user)
//! PUT    /orders/{id}                     - Set status (admin)
//! DELETE /orders/{id}                     - Cancel pending order (owner or admin)
//!
//! # Admin
//! GET    /admin/orders                    - Every order
//! PUT    /admin/orders/{id}               - Set status
//! DELETE /admin/orders/{id}               - Delete order
//!
//! # Payments
//! POST   /payments                        - Charge the cart (user)
//! ```

pub mod admin;
pub mod cart;
pub mod menu;
pub mod orders;
pub mod payments;
pub mod restaurants;
pub mod users;

use axum::{
    Json, Router,
    routing::{get, post, put},
};
use serde::Serialize;

use crate::state::AppState;

/// `{"message": "..."}` confirmation body.
#[derive(Debug, Serialize)]
pub struct Message {
    message: &'static str,
}

pub(crate) const fn message(message: &'static str) -> Json<Message> {
    Json(Message { message })
}

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .route("/google-login", post(users::google_login))
        .route("/me", get(users::me))
}

/// Create the restaurant routes router.
pub fn restaurant_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(restaurants::index).post(restaurants::create))
        .route(
            "/{id}",
            get(restaurants::show)
                .put(restaurants::update)
                .delete(restaurants::destroy),
        )
        .route(
            "/{id}/menu",
            get(restaurants::menu).post(restaurants::create_menu_item),
        )
        .route(
            "/{id}/menu/{item_id}",
            put(restaurants::update_menu_item).delete(restaurants::delete_menu_item),
        )
}

/// Create the menu routes router.
pub fn menu_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(menu::index))
        .route("/{id}/rate", post(menu::rate))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).post(cart::add))
        .route("/{id}", put(cart::update).delete(cart::remove))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::create))
        .route("/admin/all", get(admin::orders))
        .route(
            "/{id}",
            get(orders::show)
                .put(orders::update_status)
                .delete(orders::cancel),
        )
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(admin::orders))
        .route(
            "/orders/{id}",
            put(orders::update_status).delete(admin::delete_order),
        )
}

/// Create all API routes (mounted under `/api`).
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/users", user_routes())
        .nest("/restaurants", restaurant_routes())
        .nest("/menu", menu_routes())
        .nest("/cart", cart_routes())
        .nest("/orders", order_routes())
        .nest("/admin", admin_routes())
        .route("/payments", post(payments::pay))
}
