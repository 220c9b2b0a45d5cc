//! Persistence for the ordering API.
//!
//! Handlers and services never talk to Postgres directly. They go through
//! the store traits below, implemented by [`PgStore`] in production and by
//! [`MemoryStore`] in tests.
//!
//! # Tables
//!
//! - `users` - Accounts, password hashes, admin flag
//! - `restaurants` / `menu_items` / `menu_item_ratings` - Catalog
//! - `cart_items` - One row per (user, menu item)
//! - `orders` / `order_items` - Placed orders and their line snapshots
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p platter-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use platter_core::{
    CartItemId, Email, MenuItemId, OrderId, OrderStatus, Quantity, Rating, RestaurantId, UserId,
};

use crate::models::{
    CartEntry, CartItem, MenuItem, MenuItemPatch, NewMenuItem, NewOrder, NewRestaurant, NewUser,
    Order, OrderDetail, Restaurant, RestaurantPatch, User,
};

pub use memory::{FailPoint, MemoryStore};
pub use postgres::PgStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The store could not serve the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// User accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a user by id.
    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Look up a user by (normalized) email.
    async fn user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    /// Create a user.
    ///
    /// Returns [`RepositoryError::Conflict`] if the email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError>;

    /// Set or clear the admin flag.
    ///
    /// Returns [`RepositoryError::NotFound`] if no user has this email.
    async fn set_admin(&self, email: &Email, is_admin: bool) -> Result<User, RepositoryError>;
}

/// Restaurants, menu items and ratings.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_restaurants(&self) -> Result<Vec<Restaurant>, RepositoryError>;

    async fn restaurant(&self, id: RestaurantId) -> Result<Option<Restaurant>, RepositoryError>;

    async fn create_restaurant(&self, new: NewRestaurant) -> Result<Restaurant, RepositoryError>;

    /// Returns `None` if the restaurant does not exist.
    async fn update_restaurant(
        &self,
        id: RestaurantId,
        patch: RestaurantPatch,
    ) -> Result<Option<Restaurant>, RepositoryError>;

    /// Delete the restaurant row only. Returns whether it existed.
    async fn delete_restaurant(&self, id: RestaurantId) -> Result<bool, RepositoryError>;

    /// Delete every menu item of a restaurant. Returns the number removed.
    async fn delete_menu_items_for(&self, restaurant: RestaurantId)
    -> Result<u64, RepositoryError>;

    /// Menu items of one restaurant, or of the whole catalog.
    async fn list_menu_items(
        &self,
        restaurant: Option<RestaurantId>,
    ) -> Result<Vec<MenuItem>, RepositoryError>;

    async fn menu_item(&self, id: MenuItemId) -> Result<Option<MenuItem>, RepositoryError>;

    async fn create_menu_item(&self, new: NewMenuItem) -> Result<MenuItem, RepositoryError>;

    /// Update a menu item that belongs to `restaurant`.
    async fn update_menu_item(
        &self,
        restaurant: RestaurantId,
        id: MenuItemId,
        patch: MenuItemPatch,
    ) -> Result<Option<MenuItem>, RepositoryError>;

    /// Delete a menu item that belongs to `restaurant`.
    async fn delete_menu_item(
        &self,
        restaurant: RestaurantId,
        id: MenuItemId,
    ) -> Result<bool, RepositoryError>;

    /// Replace `user`'s rating of an item and store the new average, as one
    /// atomic write. Returns `None` if the item does not exist.
    async fn rate_menu_item(
        &self,
        id: MenuItemId,
        user: UserId,
        rating: Rating,
    ) -> Result<Option<MenuItem>, RepositoryError>;
}

/// Per-user carts.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// The user's rows joined with current menu details. Rows whose menu
    /// item no longer exists are omitted.
    async fn cart_entries(&self, user: UserId) -> Result<Vec<CartEntry>, RepositoryError>;

    /// Add `quantity` to the user's row for `item`, creating it if absent.
    async fn add_to_cart(
        &self,
        user: UserId,
        item: MenuItemId,
        quantity: Quantity,
    ) -> Result<CartItem, RepositoryError>;

    /// Overwrite the quantity of one of the user's rows.
    async fn update_cart_item(
        &self,
        user: UserId,
        id: CartItemId,
        quantity: Quantity,
    ) -> Result<Option<CartItem>, RepositoryError>;

    /// Remove one of the user's rows. Returns whether it existed.
    async fn remove_cart_item(&self, user: UserId, id: CartItemId)
    -> Result<bool, RepositoryError>;

    /// Remove all of the user's rows. Returns the number removed.
    async fn clear_cart(&self, user: UserId) -> Result<u64, RepositoryError>;
}

/// Orders and their lifecycle.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn create_order(&self, order: NewOrder) -> Result<Order, RepositoryError>;

    async fn order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// The user's orders, newest first, with menu details.
    async fn orders_for_user(&self, user: UserId) -> Result<Vec<OrderDetail>, RepositoryError>;

    /// One of the user's orders with menu details.
    async fn order_detail_for_user(
        &self,
        user: UserId,
        id: OrderId,
    ) -> Result<Option<OrderDetail>, RepositoryError>;

    /// Every order, newest first, with buyer and menu details.
    async fn all_orders(&self) -> Result<Vec<OrderDetail>, RepositoryError>;

    /// Overwrite the status unconditionally. Returns `None` if absent.
    async fn set_order_status(
        &self,
        id: OrderId,
        status: &OrderStatus,
    ) -> Result<Option<Order>, RepositoryError>;

    /// Move from `from` to `to` only if the order is currently in `from`.
    /// Returns whether the transition happened.
    async fn transition_order_status(
        &self,
        id: OrderId,
        from: &OrderStatus,
        to: &OrderStatus,
    ) -> Result<bool, RepositoryError>;

    /// Hard-delete an order. Returns whether it existed.
    async fn delete_order(&self, id: OrderId) -> Result<bool, RepositoryError>;
}

/// Everything the API needs from persistence.
#[async_trait]
pub trait Store: UserStore + CatalogStore + CartStore + OrderStore {
    /// Check that the backing store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a unique-constraint violation to [`RepositoryError::Conflict`].
pub(crate) fn conflict_on_unique(err: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(err)
}
