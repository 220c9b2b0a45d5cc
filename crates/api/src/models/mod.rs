//! Domain models for the ordering API.
//!
//! These are the validated shapes handlers and services work with. Row
//! types private to the Postgres store convert into them; the in-memory
//! store holds them directly.

pub mod cart;
pub mod catalog;
pub mod order;
pub mod user;

pub use cart::{CartEntry, CartItem};
pub use catalog::{
    MenuItem, MenuItemPatch, MenuItemRating, MenuItemSummary, NewMenuItem, NewRestaurant,
    Restaurant, RestaurantPatch,
};
pub use order::{Buyer, NewOrder, Order, OrderDetail, OrderLine, OrderLineDetail, OrderOwner};
pub use user::{NewUser, User};
