//! Order route handlers for customers.

use axum::{Json, body::Bytes, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use platter_core::OrderId;

use crate::error::Result;
use crate::extract::{ApiJson, ApiPath, optional_json};
use crate::middleware::{AdminUser, CurrentUser};
use crate::models::{Order, OrderDetail, OrderLine};
use crate::routes::{Message, message};
use crate::services::orders::OrderService;
use crate::state::AppState;

/// Body of `POST /orders`. Without `items` the cart is checked out.
#[derive(Debug, Default, Deserialize)]
pub struct CreateOrderRequest {
    items: Option<Vec<OrderLine>>,
    address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusRequest {
    status: Option<String>,
}

/// `POST /orders`
///
/// The body is optional: an empty body checks out the cart.
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Bytes,
) -> Result<(StatusCode, Json<Order>)> {
    let request: CreateOrderRequest = optional_json(&body)?;
    let orders = OrderService::new(state.store());

    let order = match request.items {
        Some(items) => orders.submit(user.id, items, request.address).await?,
        None => orders.checkout(&user, request.address).await?,
    };

    Ok((StatusCode::CREATED, Json(order)))
}

/// `GET /orders`
pub async fn index(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<OrderDetail>>> {
    Ok(Json(OrderService::new(state.store()).for_user(user.id).await?))
}

/// `GET /orders/{id}`
pub async fn show(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<OrderDetail>> {
    Ok(Json(
        OrderService::new(state.store()).one_for_user(user.id, id).await?,
    ))
}

/// `DELETE /orders/{id}`: cancel a pending order.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn cancel(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<Message>> {
    OrderService::new(state.store()).cancel(&user, id).await?;
    Ok(message("Order cancelled successfully"))
}

/// `PUT /orders/{id}` and `PUT /admin/orders/{id}`
#[instrument(skip(state, _admin, body))]
pub async fn update_status(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<OrderId>,
    ApiJson(body): ApiJson<StatusRequest>,
) -> Result<Json<Order>> {
    let order = OrderService::new(state.store())
        .set_status(id, body.status.as_deref())
        .await?;

    Ok(Json(order))
}
