//! Google ID token verification.
//!
//! Sign-in with Google hands the client an ID token, which the API checks
//! against Google's `tokeninfo` endpoint. The token is only accepted when
//! its audience is this application's OAuth client id.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::config::GoogleConfig;

/// Errors that can occur when verifying a Google ID token.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Google rejected the token.
    #[error("token rejected: {status} - {message}")]
    Rejected { status: u16, message: String },

    /// The token was issued for another client.
    #[error("audience mismatch")]
    AudienceMismatch,

    /// The token carries no email address.
    #[error("token has no email claim")]
    MissingEmail,
}

/// The verified identity behind a Google ID token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleIdentity {
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Verifies third-party identity tokens.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify `id_token` and return the identity it asserts.
    async fn verify(&self, id_token: &str) -> Result<GoogleIdentity, IdentityError>;
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

/// [`IdentityVerifier`] backed by Google's `tokeninfo` endpoint.
#[derive(Debug, Clone)]
pub struct GoogleTokenVerifier {
    client: reqwest::Client,
    client_id: String,
    tokeninfo_url: String,
}

impl GoogleTokenVerifier {
    /// Create a verifier for the configured OAuth client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &GoogleConfig) -> Result<Self, IdentityError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            client_id: config.client_id.clone(),
            tokeninfo_url: config.tokeninfo_url.clone(),
        })
    }
}

#[async_trait]
impl IdentityVerifier for GoogleTokenVerifier {
    #[tracing::instrument(skip_all)]
    async fn verify(&self, id_token: &str) -> Result<GoogleIdentity, IdentityError> {
        let response = self
            .client
            .get(&self.tokeninfo_url)
            .query(&[("id_token", id_token)])
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(IdentityError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let info: TokenInfo = response.json().await?;
        identity_for_client(info, &self.client_id)
    }
}

fn identity_for_client(info: TokenInfo, client_id: &str) -> Result<GoogleIdentity, IdentityError> {
    if info.aud != client_id {
        return Err(IdentityError::AudienceMismatch);
    }

    Ok(GoogleIdentity {
        email: info.email.ok_or(IdentityError::MissingEmail)?,
        name: info.name,
        picture: info.picture,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn info(aud: &str, email: Option<&str>) -> TokenInfo {
        TokenInfo {
            aud: aud.to_owned(),
            email: email.map(String::from),
            name: Some("Ada".to_owned()),
            picture: Some("https://example.com/ada.png".to_owned()),
        }
    }

    #[test]
    fn test_accepts_matching_audience() {
        let identity = identity_for_client(info("client-1", Some("ada@example.com")), "client-1")
            .unwrap();
        assert_eq!(identity.email, "ada@example.com");
        assert_eq!(identity.name.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_rejects_other_audience() {
        assert!(matches!(
            identity_for_client(info("client-2", Some("ada@example.com")), "client-1"),
            Err(IdentityError::AudienceMismatch)
        ));
    }

    #[test]
    fn test_requires_email() {
        assert!(matches!(
            identity_for_client(info("client-1", None), "client-1"),
            Err(IdentityError::MissingEmail)
        ));
    }

    #[test]
    fn test_tokeninfo_payload_parses() {
        let json = r#"{
            "iss": "https://accounts.google.com",
            "aud": "client-1",
            "email": "ada@example.com",
            "email_verified": "true",
            "name": "Ada Lovelace",
            "picture": "https://example.com/ada.png"
        }"#;
        let parsed: TokenInfo = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.aud, "client-1");
    }
}
