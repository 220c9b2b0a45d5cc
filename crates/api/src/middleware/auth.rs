//! Bearer-token authentication extractors.
//!
//! Every protected handler takes either [`CurrentUser`] or [`AdminUser`].
//! Both run [`authorize`] before the handler body, so a rejected request
//! never reaches the handler and has no side effects.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};

use crate::error::{AppError, set_sentry_user};
use crate::models::User;
use crate::state::AppState;

/// What a caller must be to pass the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Any authenticated user.
    User,
    /// An authenticated user with the admin flag.
    Admin,
}

impl Capability {
    const fn rejection(self) -> &'static str {
        match self {
            Self::User => "Please authenticate.",
            Self::Admin => "Please authenticate as an admin.",
        }
    }
}

/// Resolve the bearer token in `headers` to a user holding `capability`.
///
/// # Errors
///
/// Returns `AppError::Unauthorized` for a missing, malformed, badly signed,
/// or expired token, an unknown user, or a non-admin where an admin is
/// required. Store failures surface as `AppError::Database`.
pub async fn authorize(
    state: &AppState,
    headers: &HeaderMap,
    capability: Capability,
) -> Result<User, AppError> {
    let reject = || AppError::Unauthorized(capability.rejection().to_owned());

    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(reject)?;

    let claims = state.tokens().verify(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        reject()
    })?;

    let user = state
        .store()
        .user_by_id(claims.sub)
        .await?
        .ok_or_else(reject)?;

    if capability == Capability::Admin && !user.is_admin {
        tracing::warn!(user_id = %user.id, "Non-admin attempted admin operation");
        return Err(reject());
    }

    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(user)
}

/// Extractor that requires an authenticated user.
///
/// # Example
///
/// ```rust,ignore
/// async fn profile(CurrentUser(user): CurrentUser) -> Json<User> {
///     Json(user)
/// }
/// ```
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authorize(state, &parts.headers, Capability::User)
            .await
            .map(Self)
    }
}

/// Extractor that requires an authenticated administrator.
pub struct AdminUser(pub User);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authorize(state, &parts.headers, Capability::Admin)
            .await
            .map(Self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::http::HeaderValue;
    use secrecy::SecretString;

    use platter_core::{Email, UserId};

    use super::*;
    use crate::db::{FailPoint, MemoryStore, UserStore};
    use crate::models::NewUser;
    use crate::services::auth::TokenSigner;
    use crate::services::google::{GoogleIdentity, IdentityError, IdentityVerifier};
    use crate::services::stripe::{ChargeRequest, GatewayError, PaymentGateway, PaymentIntent};

    struct Unreachable;

    #[async_trait]
    impl PaymentGateway for Unreachable {
        async fn create_and_confirm(
            &self,
            _charge: ChargeRequest,
        ) -> Result<PaymentIntent, GatewayError> {
            Err(GatewayError::Parse("not under test".to_owned()))
        }
    }

    #[async_trait]
    impl IdentityVerifier for Unreachable {
        async fn verify(&self, _id_token: &str) -> Result<GoogleIdentity, IdentityError> {
            Err(IdentityError::MissingEmail)
        }
    }

    fn signer() -> TokenSigner {
        TokenSigner::new(
            SecretString::from("k7#Qz!p2Vw9@Lm4$Rt8^Xy1&Bn6*Cd3%"),
            Duration::from_secs(3600),
        )
    }

    fn state(store: &MemoryStore) -> AppState {
        AppState::new(
            Arc::new(store.clone()),
            signer(),
            Arc::new(Unreachable),
            Arc::new(Unreachable),
            "usd",
        )
    }

    async fn seed_user(store: &MemoryStore, is_admin: bool) -> User {
        let email = if is_admin {
            "admin@example.com"
        } else {
            "robin@example.com"
        };
        store
            .create_user(NewUser {
                name: "Robin".to_owned(),
                email: Email::parse(email).unwrap(),
                password_hash: "hash".to_owned(),
                address: None,
                phone: None,
                profile_picture: None,
                is_admin,
            })
            .await
            .unwrap()
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    fn rejection_message(result: Result<User, AppError>) -> String {
        match result {
            Err(AppError::Unauthorized(message)) => message,
            Err(other) => panic!("expected Unauthorized, got {other:?}"),
            Ok(user) => panic!("expected rejection, got user {}", user.id),
        }
    }

    #[tokio::test]
    async fn test_valid_token_resolves_user() {
        let store = MemoryStore::new();
        let user = seed_user(&store, false).await;
        let state = state(&store);
        let token = state.tokens().issue(user.id).unwrap();

        let resolved = authorize(&state, &bearer(&token), Capability::User).await.unwrap();
        assert_eq!(resolved.id, user.id);
    }

    #[tokio::test]
    async fn test_missing_or_malformed_header() {
        let store = MemoryStore::new();
        let state = state(&store);

        assert_eq!(
            rejection_message(authorize(&state, &HeaderMap::new(), Capability::User).await),
            "Please authenticate."
        );

        let mut basic = HeaderMap::new();
        basic.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(
            rejection_message(authorize(&state, &basic, Capability::Admin).await),
            "Please authenticate as an admin."
        );
    }

    #[tokio::test]
    async fn test_unknown_user_and_bad_signature() {
        let store = MemoryStore::new();
        let state = state(&store);

        let ghost = state.tokens().issue(UserId::new(42)).unwrap();
        rejection_message(authorize(&state, &bearer(&ghost), Capability::User).await);

        let user = seed_user(&store, false).await;
        let other_signer = TokenSigner::new(
            SecretString::from("Zx8!mN3@qW7#eR1$tY5%uI9^oP2&aS6*"),
            Duration::from_secs(3600),
        );
        let forged = other_signer.issue(user.id).unwrap();
        rejection_message(authorize(&state, &bearer(&forged), Capability::User).await);
    }

    #[tokio::test]
    async fn test_admin_capability_requires_flag() {
        let store = MemoryStore::new();
        let user = seed_user(&store, false).await;
        let admin = seed_user(&store, true).await;
        let state = state(&store);

        let user_token = state.tokens().issue(user.id).unwrap();
        assert_eq!(
            rejection_message(authorize(&state, &bearer(&user_token), Capability::Admin).await),
            "Please authenticate as an admin."
        );

        let admin_token = state.tokens().issue(admin.id).unwrap();
        assert!(authorize(&state, &bearer(&admin_token), Capability::Admin).await.is_ok());
        assert!(authorize(&state, &bearer(&admin_token), Capability::User).await.is_ok());
    }

    #[tokio::test]
    async fn test_store_failure_is_not_an_auth_failure() {
        let store = MemoryStore::new();
        let user = seed_user(&store, false).await;
        let state = state(&store);
        let token = state.tokens().issue(user.id).unwrap();

        store.fail_on(FailPoint::LoadUser);
        assert!(matches!(
            authorize(&state, &bearer(&token), Capability::User).await,
            Err(AppError::Database(_))
        ));
    }
}
