//! Charging the current cart through the payment processor.
//!
//! The charge is always computed from the user's cart as it is now, not from
//! any order. Paying neither creates an order nor clears the cart, and no
//! idempotency key is sent: a repeated request charges again.

use serde::Serialize;
use thiserror::Error;
use url::Url;

use platter_core::{PriceError, UserId, order_total};

use crate::db::{RepositoryError, Store};
use crate::services::non_blank;
use crate::services::stripe::{ChargeRequest, GatewayError, PaymentGateway, PaymentIntentStatus};

/// Errors that can occur while taking a payment.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Payment method ID is required")]
    MissingPaymentMethod,

    #[error("Return URL is required")]
    MissingReturnUrl,

    #[error("Return URL must be an absolute URL")]
    InvalidReturnUrl,

    #[error("Cart is empty")]
    EmptyCart,

    /// The cart total cannot be charged. Catalog prices are validated on
    /// write, so this is a server-side fault.
    #[error("{0}")]
    Amount(#[from] PriceError),

    #[error("Payment failed with status: {0}")]
    Unsuccessful(&'static str),

    #[error("Payment requires action but no client secret was returned")]
    MissingClientSecret,

    #[error("{0}")]
    Gateway(#[from] GatewayError),

    /// The cart could not be read.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl PaymentError {
    /// The message shown to the client.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::Gateway(GatewayError::Api { message, .. }) => message.clone(),
            Self::Gateway(_) => "Payment processor unavailable".to_owned(),
            Self::Repository(_) | Self::Amount(_) => "Internal server error".to_owned(),
            other => other.to_string(),
        }
    }
}

/// Result of a confirmed charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PaymentOutcome {
    /// `{ "success": true }`
    Succeeded { success: bool },
    /// The customer must complete an authentication step client-side.
    RequiresAction {
        success: bool,
        requires_action: bool,
        payment_intent_client_secret: String,
    },
}

impl PaymentOutcome {
    const fn succeeded() -> Self {
        Self::Succeeded { success: true }
    }

    const fn requires_action(client_secret: String) -> Self {
        Self::RequiresAction {
            success: false,
            requires_action: true,
            payment_intent_client_secret: client_secret,
        }
    }
}

/// Payment service.
pub struct PaymentService<'a> {
    store: &'a dyn Store,
    gateway: &'a dyn PaymentGateway,
    currency: &'a str,
}

impl<'a> PaymentService<'a> {
    #[must_use]
    pub const fn new(
        store: &'a dyn Store,
        gateway: &'a dyn PaymentGateway,
        currency: &'a str,
    ) -> Self {
        Self {
            store,
            gateway,
            currency,
        }
    }

    /// Charge the user's current cart total.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a missing payment method or a missing
    /// or relative return URL, `PaymentError::EmptyCart` for an empty cart,
    /// and `PaymentError::Unsuccessful` or `PaymentError::Gateway` when the
    /// processor does not take the payment.
    #[tracing::instrument(skip(self, payment_method, return_url))]
    pub async fn pay_for_cart(
        &self,
        user: UserId,
        payment_method: Option<String>,
        return_url: Option<String>,
    ) -> Result<PaymentOutcome, PaymentError> {
        let payment_method = non_blank(payment_method).ok_or(PaymentError::MissingPaymentMethod)?;
        let return_url = non_blank(return_url).ok_or(PaymentError::MissingReturnUrl)?;
        let return_url = Url::parse(&return_url).map_err(|_| PaymentError::InvalidReturnUrl)?;

        let cart = self.store.cart_entries(user).await?;
        if cart.is_empty() {
            return Err(PaymentError::EmptyCart);
        }

        let total = order_total(cart.iter().map(|e| (e.menu_item.price, e.quantity)))?;
        let amount = total.to_minor_units()?;
        tracing::info!(%total, amount, "Creating PaymentIntent for cart");

        let intent = self
            .gateway
            .create_and_confirm(ChargeRequest {
                amount,
                currency: self.currency.to_owned(),
                payment_method,
                return_url,
            })
            .await?;

        match intent.status {
            PaymentIntentStatus::Succeeded => Ok(PaymentOutcome::succeeded()),
            PaymentIntentStatus::RequiresAction => intent
                .client_secret
                .map(PaymentOutcome::requires_action)
                .ok_or(PaymentError::MissingClientSecret),
            other => Err(PaymentError::Unsuccessful(other.as_str())),
        }
    }
}
