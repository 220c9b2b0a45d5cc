//! Administrator account commands.
//!
//! Registration through the API never grants the admin flag, so these
//! commands are the only way to create administrators.
//!
//! # Usage
//!
//! ```bash
//! # Create a new administrator
//! platter-cli admin create -e admin@example.com -n "Admin Name" -p 'long random password'
//!
//! # Promote an existing user
//! platter-cli admin promote -e someone@example.com
//! ```
//!
//! # Environment Variables
//!
//! - `PLATTER_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

use platter_api::db::{self, PgStore, RepositoryError, UserStore};
use platter_api::models::NewUser;
use platter_api::services::auth::{AuthError, hash_password};
use platter_core::{Email, EmailError, UserId};
use thiserror::Error;

use super::{DATABASE_URL_VAR, database_url};

const MIN_PASSWORD_LENGTH: usize = 12;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Store operation failed.
    #[error("Store error: {0}")]
    Store(RepositoryError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Password too short for an administrator.
    #[error("Password must be at least {MIN_PASSWORD_LENGTH} characters")]
    WeakPassword,

    /// Password hashing failed.
    #[error("Password hashing failed: {0}")]
    Hash(#[from] AuthError),

    /// User already exists.
    #[error("User already exists with email: {0}")]
    UserExists(String),

    /// No user has this email.
    #[error("No user with email: {0}")]
    UserNotFound(String),
}

async fn connect() -> Result<PgStore, AdminError> {
    let database_url = database_url().ok_or(AdminError::MissingEnvVar(DATABASE_URL_VAR))?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;
    Ok(PgStore::new(pool))
}

/// Create a new administrator account.
///
/// # Returns
///
/// The ID of the created user.
///
/// # Errors
///
/// Returns an error for an invalid email, a short password, an existing
/// account, or a database failure.
pub async fn create_user(email: &str, name: &str, password: &str) -> Result<UserId, AdminError> {
    let email = Email::parse(email)?;
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AdminError::WeakPassword);
    }

    let store = connect().await?;
    tracing::info!("Creating admin user: {}", email);

    let user = store
        .create_user(NewUser {
            name: name.trim().to_owned(),
            email: email.clone(),
            password_hash: hash_password(password)?,
            address: None,
            phone: None,
            profile_picture: None,
            is_admin: true,
        })
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AdminError::UserExists(email.to_string()),
            other => AdminError::Store(other),
        })?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );

    Ok(user.id)
}

/// Set the admin flag on an existing user.
///
/// # Errors
///
/// Returns an error for an invalid or unknown email, or a database failure.
pub async fn promote(email: &str) -> Result<UserId, AdminError> {
    let email = Email::parse(email)?;
    let store = connect().await?;

    let user = store.set_admin(&email, true).await.map_err(|e| match e {
        RepositoryError::NotFound => AdminError::UserNotFound(email.to_string()),
        other => AdminError::Store(other),
    })?;

    tracing::info!("User {} ({}) is now an administrator", user.id, user.email);
    Ok(user.id)
}
