//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A required registration or login field was missing or blank.
    #[error("missing required fields")]
    MissingFields,

    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] platter_core::EmailError),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Bearer token is malformed, badly signed, or uses another algorithm.
    #[error("invalid token: {0}")]
    InvalidToken(&'static str),

    /// Bearer token has passed its `exp` claim.
    #[error("token expired")]
    TokenExpired,

    /// Token signing failed.
    #[error("token signing failed")]
    TokenSigning,

    /// Google sign-in could not be completed.
    #[error("google login failed: {0}")]
    GoogleLoginFailed(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
