//! Stripe payment intents client.
//!
//! The API only ever creates and confirms a payment intent in one call; it
//! never retrieves, captures, cancels or refunds one.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::config::StripeConfig;

/// Errors that can occur when talking to the payment processor.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The processor refused the request (declined card, bad parameters...).
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A request to create and immediately confirm a payment intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeRequest {
    /// Amount in the currency's minor unit (cents).
    pub amount: i64,
    /// ISO currency code, lowercase.
    pub currency: String,
    /// Client-side payment method id.
    pub payment_method: String,
    /// Where the processor sends the customer after an off-session step.
    pub return_url: Url,
}

/// Payment intent lifecycle states.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentIntentStatus {
    Succeeded,
    RequiresAction,
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresCapture,
    Processing,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl PaymentIntentStatus {
    /// The processor's name for this status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::RequiresAction => "requires_action",
            Self::RequiresPaymentMethod => "requires_payment_method",
            Self::RequiresConfirmation => "requires_confirmation",
            Self::RequiresCapture => "requires_capture",
            Self::Processing => "processing",
            Self::Canceled => "canceled",
            Self::Unknown => "unknown",
        }
    }
}

/// The fields of a payment intent the API acts on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub status: PaymentIntentStatus,
    pub client_secret: Option<String>,
}

/// Charges customers through a payment processor.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create and confirm a payment intent in one synchronous call.
    async fn create_and_confirm(&self, charge: ChargeRequest)
    -> Result<PaymentIntent, GatewayError>;
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Stripe REST API client.
#[derive(Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    api_base: String,
}

impl StripeClient {
    /// Create a new Stripe API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &StripeConfig) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.secret_key.expose_secret());
        let mut auth_value = HeaderValue::from_str(&auth_value)
            .map_err(|e| GatewayError::Parse(format!("Invalid API key format: {e}")))?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_owned(),
        })
    }
}

/// Form parameters for `POST /v1/payment_intents`.
fn charge_form(charge: &ChargeRequest) -> Vec<(&'static str, String)> {
    vec![
        ("amount", charge.amount.to_string()),
        ("currency", charge.currency.clone()),
        ("payment_method", charge.payment_method.clone()),
        ("confirm", "true".to_owned()),
        ("automatic_payment_methods[enabled]", "true".to_owned()),
        ("automatic_payment_methods[allow_redirects]", "never".to_owned()),
        ("return_url", charge.return_url.to_string()),
    ]
}

#[async_trait]
impl PaymentGateway for StripeClient {
    #[tracing::instrument(skip_all, fields(amount = charge.amount, currency = %charge.currency))]
    async fn create_and_confirm(
        &self,
        charge: ChargeRequest,
    ) -> Result<PaymentIntent, GatewayError> {
        let url = format!("{}/v1/payment_intents", self.api_base);

        let response = self
            .client
            .post(&url)
            .form(&charge_form(&charge))
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .ok()
                .and_then(|e| e.error.message)
                .unwrap_or(body);
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let intent: PaymentIntent = response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))?;

        tracing::info!(
            payment_intent = %intent.id,
            status = intent.status.as_str(),
            "PaymentIntent created"
        );
        Ok(intent)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_charge_form_matches_processor_parameters() {
        let form = charge_form(&ChargeRequest {
            amount: 2500,
            currency: "usd".to_owned(),
            payment_method: "pm_card_visa".to_owned(),
            return_url: Url::parse("https://shop.example.com/checkout/done").unwrap(),
        });

        let get = |key: &str| {
            form.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("amount"), Some("2500"));
        assert_eq!(get("confirm"), Some("true"));
        assert_eq!(get("automatic_payment_methods[allow_redirects]"), Some("never"));
        assert_eq!(get("return_url"), Some("https://shop.example.com/checkout/done"));
    }

    #[test]
    fn test_intent_status_parses_unknown_values() {
        let intent: PaymentIntent = serde_json::from_str(
            r#"{"id":"pi_1","status":"requires_action","client_secret":"pi_1_secret"}"#,
        )
        .unwrap();
        assert_eq!(intent.status, PaymentIntentStatus::RequiresAction);

        let intent: PaymentIntent =
            serde_json::from_str(r#"{"id":"pi_2","status":"something_new","client_secret":null}"#)
                .unwrap();
        assert_eq!(intent.status, PaymentIntentStatus::Unknown);
    }

    #[test]
    fn test_error_envelope_parses() {
        let body = r#"{"error":{"message":"Your card was declined.","type":"card_error"}}"#;
        let envelope: ErrorEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.error.message.as_deref(), Some("Your card was declined."));
    }
}
