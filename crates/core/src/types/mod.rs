//! Core types for Platter.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod quantity;
pub mod rating;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceError, line_total, order_total};
pub use quantity::{Quantity, QuantityError};
pub use rating::{Rating, RatingError, average_rating};
pub use status::OrderStatus;
