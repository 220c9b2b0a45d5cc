//! Payment handler.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::extract::ApiJson;
use crate::middleware::CurrentUser;
use crate::services::payments::{PaymentOutcome, PaymentService};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PaymentRequest {
    #[serde(rename = "paymentMethodId")]
    payment_method_id: Option<String>,
    return_url: Option<String>,
}

/// `POST /payments`: charge the caller's current cart total.
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn pay(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(body): ApiJson<PaymentRequest>,
) -> Result<Json<PaymentOutcome>> {
    let outcome = PaymentService::new(state.store(), state.payments(), state.currency())
        .pay_for_cart(user.id, body.payment_method_id, body.return_url)
        .await?;

    Ok(Json(outcome))
}
