//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Registration, password login, Google sign-in, bearer tokens
//! - `catalog` - Restaurants, menu items, ratings
//! - `cart` - Per-user cart rows
//! - `orders` - Order creation, queries, cancellation, status updates
//! - `payments` - Charging the current cart
//! - `google` / `stripe` - External collaborators behind traits
//!
//! Services borrow what they need from `AppState` for the length of one
//! request; none of them hold state of their own.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod google;
pub mod orders;
pub mod payments;
pub mod stripe;

/// Trim a submitted string field, treating blank as absent.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
