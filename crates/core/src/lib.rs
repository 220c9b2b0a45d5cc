//! Platter Core - Shared domain types.
//!
//! This crate provides the value types used across the Platter components:
//! - `api` - The HTTP/JSON food-ordering service
//! - `cli` - Command-line tools for migrations, admin accounts, and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure calculations - no I/O, no
//! database access, no HTTP clients. Order totals, rating averages, and
//! minor-unit conversion live here so every caller computes them the same way.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, emails, prices, quantities, ratings,
//!   and order statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
