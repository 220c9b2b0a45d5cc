//! Signed bearer tokens.
//!
//! Tokens are compact JWS strings (`header.claims.signature`, each part
//! base64url without padding) signed with HMAC-SHA256, so any standard JWT
//! library configured for `HS256` can read them. Only `HS256` is accepted on
//! verification; the `alg` header is never trusted to pick the algorithm.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use platter_core::UserId;

use super::AuthError;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HS256";

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

/// Token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// The authenticated user.
    pub sub: UserId,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch. Absent tokens never expire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// Issues and verifies bearer tokens with a shared secret.
#[derive(Debug, Clone)]
pub struct TokenSigner {
    secret: SecretString,
    ttl: Duration,
}

impl TokenSigner {
    /// Create a signer whose expiring tokens live for `ttl`.
    #[must_use]
    pub const fn new(secret: SecretString, ttl: Duration) -> Self {
        Self { secret, ttl }
    }

    /// Issue a token for `user` that expires after the configured TTL.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenSigning` if the claims cannot be encoded.
    pub fn issue(&self, user: UserId) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).map_err(|_| AuthError::TokenSigning)?;
        self.sign(&Claims {
            sub: user,
            iat: now,
            exp: Some(now.saturating_add(ttl)),
        })
    }

    /// Issue a token for `user` with no `exp` claim.
    ///
    /// Used for Google sign-in, whose tokens have never carried an expiry.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenSigning` if the claims cannot be encoded.
    pub fn issue_without_expiry(&self, user: UserId) -> Result<String, AuthError> {
        self.sign(&Claims {
            sub: user,
            iat: Utc::now().timestamp(),
            exp: None,
        })
    }

    /// Verify a token's signature and expiry and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for malformed or badly signed
    /// tokens and `AuthError::TokenExpired` once `exp` has passed.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    fn verify_at(&self, token: &str, now: i64) -> Result<Claims, AuthError> {
        let mut parts = token.split('.');
        let (Some(header), Some(claims), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::InvalidToken("expected three segments"));
        };

        let header: Header = decode_segment(header)?;
        if header.alg != ALGORITHM {
            return Err(AuthError::InvalidToken("unsupported algorithm"));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AuthError::InvalidToken("signature is not base64url"))?;
        let signing_input = token
            .rsplit_once('.')
            .map(|(input, _)| input)
            .ok_or(AuthError::InvalidToken("expected three segments"))?;
        self.mac(signing_input)?
            .verify_slice(&signature)
            .map_err(|_| AuthError::InvalidToken("bad signature"))?;

        let claims: Claims = decode_segment(claims)?;
        if claims.exp.is_some_and(|exp| now >= exp) {
            return Err(AuthError::TokenExpired);
        }

        Ok(claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        let header = Header {
            alg: ALGORITHM.to_owned(),
            typ: Some("JWT".to_owned()),
        };
        let header = encode_segment(&header)?;
        let claims = encode_segment(claims)?;
        let signing_input = format!("{header}.{claims}");

        let signature = self.mac(&signing_input)?.finalize().into_bytes();
        Ok(format!(
            "{signing_input}.{}",
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }

    fn mac(&self, signing_input: &str) -> Result<HmacSha256, AuthError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| AuthError::TokenSigning)?;
        mac.update(signing_input.as_bytes());
        Ok(mac)
    }
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, AuthError> {
    let json = serde_json::to_vec(value).map_err(|_| AuthError::TokenSigning)?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T, AuthError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| AuthError::InvalidToken("segment is not base64url"))?;
    serde_json::from_slice(&bytes).map_err(|_| AuthError::InvalidToken("segment is not JSON"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new(
            SecretString::from("k7#Qm2$vLx9!pR4@tZ8&wN1*yB5^cF3%"),
            Duration::from_secs(3600),
        )
    }

    #[test]
    fn test_issued_token_verifies() {
        let signer = signer();
        let token = signer.issue(UserId::new(42)).unwrap();

        let claims = signer.verify(&token).unwrap();
        assert_eq!(claims.sub, UserId::new(42));
        assert_eq!(claims.exp, Some(claims.iat + 3600));
    }

    #[test]
    fn test_token_without_expiry_has_no_exp_claim() {
        let signer = signer();
        let token = signer.issue_without_expiry(UserId::new(1)).unwrap();

        let claims = signer.verify_at(&token, i64::MAX).unwrap();
        assert_eq!(claims.exp, None);
    }

    #[test]
    fn test_expired_token_rejected() {
        let signer = signer();
        let token = signer.issue(UserId::new(1)).unwrap();
        let later = Utc::now().timestamp() + 3601;

        assert!(matches!(
            signer.verify_at(&token, later),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let other = TokenSigner::new(
            SecretString::from("Zp0!rT6@uQ3#eW9$yH2%jK5^mN8&bV1*"),
            Duration::from_secs(3600),
        );
        let token = other.issue(UserId::new(1)).unwrap();

        assert!(matches!(
            signer().verify(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_tampered_claims_rejected() {
        let signer = signer();
        let token = signer.issue(UserId::new(1)).unwrap();
        let (header, rest) = token.split_once('.').unwrap();
        let (_, signature) = rest.split_once('.').unwrap();
        let forged = encode_segment(&Claims {
            sub: UserId::new(2),
            iat: 0,
            exp: None,
        })
        .unwrap();

        let tampered = format!("{header}.{forged}.{signature}");
        assert!(matches!(
            signer.verify(&tampered),
            Err(AuthError::InvalidToken("bad signature"))
        ));
    }

    #[test]
    fn test_none_algorithm_rejected() {
        let header = encode_segment(&Header {
            alg: "none".to_owned(),
            typ: None,
        })
        .unwrap();
        let claims = encode_segment(&Claims {
            sub: UserId::new(1),
            iat: 0,
            exp: None,
        })
        .unwrap();

        assert!(matches!(
            signer().verify(&format!("{header}.{claims}.")),
            Err(AuthError::InvalidToken("unsupported algorithm"))
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(signer().verify("not-a-token").is_err());
        assert!(signer().verify("a.b.c.d").is_err());
        assert!(signer().verify("").is_err());
    }
}
