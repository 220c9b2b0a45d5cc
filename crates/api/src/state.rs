//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::db::{PgStore, Store};
use crate::services::auth::TokenSigner;
use crate::services::google::{GoogleTokenVerifier, IdentityError, IdentityVerifier};
use crate::services::stripe::{GatewayError, PaymentGateway, StripeClient};

/// Error building the external clients held in state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("payment gateway: {0}")]
    Gateway(#[from] GatewayError),
    #[error("identity verifier: {0}")]
    Identity(#[from] IdentityError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the store, the token signer, and the external collaborators.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<dyn Store>,
    tokens: TokenSigner,
    payments: Arc<dyn PaymentGateway>,
    identity: Arc<dyn IdentityVerifier>,
    currency: String,
}

impl AppState {
    /// Assemble state from its parts. Tests use this with the in-memory
    /// store and stub collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        tokens: TokenSigner,
        payments: Arc<dyn PaymentGateway>,
        identity: Arc<dyn IdentityVerifier>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                store,
                tokens,
                payments,
                identity,
                currency: currency.into(),
            }),
        }
    }

    /// Production state: Postgres, Stripe, and Google.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn from_config(config: &ApiConfig, pool: PgPool) -> Result<Self, StateError> {
        let payments = StripeClient::new(&config.stripe)?;
        let identity = GoogleTokenVerifier::new(&config.google)?;

        Ok(Self::new(
            Arc::new(PgStore::new(pool)),
            TokenSigner::new(config.jwt_secret.clone(), config.token_ttl),
            Arc::new(payments),
            Arc::new(identity),
            config.stripe.currency.clone(),
        ))
    }

    /// Get a reference to the persistence layer.
    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    /// Get a reference to the bearer token signer.
    #[must_use]
    pub fn tokens(&self) -> &TokenSigner {
        &self.inner.tokens
    }

    /// Get a reference to the payment processor client.
    #[must_use]
    pub fn payments(&self) -> &dyn PaymentGateway {
        self.inner.payments.as_ref()
    }

    /// Get a reference to the Google ID token verifier.
    #[must_use]
    pub fn identity(&self) -> &dyn IdentityVerifier {
        self.inner.identity.as_ref()
    }

    /// Currency charged by the payment bridge.
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.inner.currency
    }
}
