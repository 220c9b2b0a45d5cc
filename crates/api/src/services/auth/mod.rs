//! Authentication service.
//!
//! Provides password registration and login, Google sign-in, and the bearer
//! tokens all three hand out.

mod error;
mod token;

pub use error::AuthError;
pub use token::{Claims, TokenSigner};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Serialize;

use platter_core::Email;

use crate::db::{RepositoryError, Store};
use crate::models::{NewUser, User};
use crate::services::google::IdentityVerifier;
use crate::services::non_blank;

/// A user together with a freshly issued bearer token.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

/// Registration input as submitted. Blank fields count as missing.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

/// Authentication service.
///
/// Handles registration, password login, and Google sign-in.
pub struct AuthService<'a> {
    store: &'a dyn Store,
    tokens: &'a TokenSigner,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a dyn Store, tokens: &'a TokenSigner) -> Self {
        Self { store, tokens }
    }

    /// Register a new user with email and password.
    ///
    /// New accounts never carry the admin flag, whatever the client sends;
    /// administrators are created with the CLI.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingFields` if name, email or password is blank.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(&self, input: Registration) -> Result<AuthSession, AuthError> {
        let (Some(name), Some(email), Some(password)) = (
            non_blank(input.name),
            non_blank(input.email),
            input.password.filter(|p| !p.is_empty()),
        ) else {
            return Err(AuthError::MissingFields);
        };

        let email = Email::parse(&email)?;
        if self.store.user_by_email(&email).await?.is_some() {
            return Err(AuthError::UserAlreadyExists);
        }

        let password_hash = hash_password(&password)?;

        let user = self
            .store
            .create_user(NewUser {
                name,
                email,
                password_hash,
                address: non_blank(input.address),
                phone: non_blank(input.phone),
                profile_picture: None,
                is_admin: false,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "User registered");

        let token = self.tokens.issue(user.id)?;
        Ok(AuthSession { user, token })
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingFields` if email or password is blank.
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(
        &self,
        email: Option<String>,
        password: Option<String>,
    ) -> Result<AuthSession, AuthError> {
        let (Some(email), Some(password)) = (non_blank(email), password.filter(|p| !p.is_empty()))
        else {
            return Err(AuthError::MissingFields);
        };

        // A malformed email can't belong to anyone.
        let email = Email::parse(&email).map_err(|_| AuthError::InvalidCredentials)?;

        let user = self
            .store
            .user_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(&password, &user.password_hash)?;

        let token = self.tokens.issue(user.id)?;
        Ok(AuthSession { user, token })
    }

    /// Sign in with a Google ID token, creating the account on first use.
    ///
    /// Google sessions are issued without an expiry.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::GoogleLoginFailed` for any failure, including an
    /// unverifiable token and store errors.
    pub async fn google_login(
        &self,
        verifier: &dyn IdentityVerifier,
        id_token: Option<&str>,
    ) -> Result<AuthSession, AuthError> {
        let Some(id_token) = id_token.filter(|t| !t.trim().is_empty()) else {
            return Err(AuthError::GoogleLoginFailed("missing token".to_owned()));
        };

        self.google_login_inner(verifier, id_token)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Google login failed");
                AuthError::GoogleLoginFailed(e.to_string())
            })
    }

    async fn google_login_inner(
        &self,
        verifier: &dyn IdentityVerifier,
        id_token: &str,
    ) -> Result<AuthSession, Box<dyn std::error::Error + Send + Sync>> {
        let identity = verifier.verify(id_token).await?;
        let email = Email::parse(&identity.email)?;

        let user = match self.store.user_by_email(&email).await? {
            Some(user) => user,
            None => {
                let name = identity
                    .name
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| email.local_part().to_owned());
                let password_hash = hash_password(&random_password())?;

                let user = self
                    .store
                    .create_user(NewUser {
                        name,
                        email,
                        password_hash,
                        address: None,
                        phone: None,
                        profile_picture: identity.picture,
                        is_admin: false,
                    })
                    .await?;
                tracing::info!(user_id = %user.id, "User created from Google sign-in");
                user
            }
        };

        let token = self.tokens.issue_without_expiry(user.id)?;
        Ok(AuthSession { user, token })
    }
}

/// A throwaway password for accounts that only sign in through Google.
fn random_password() -> String {
    let bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
