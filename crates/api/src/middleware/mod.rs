//! HTTP middleware stack for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. CORS
//! 3. `TraceLayer` (request tracing)
//! 4. Request ID (add unique ID to each request)
//!
//! Authentication is not a layer: protected handlers take the
//! [`CurrentUser`] or [`AdminUser`] extractor.

pub mod auth;
pub mod request_id;

pub use auth::{AdminUser, Capability, CurrentUser, authorize};
pub use request_id::request_id_middleware;
