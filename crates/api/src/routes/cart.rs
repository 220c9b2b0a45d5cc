//! Cart route handlers. Every route acts on the caller's own cart.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use platter_core::{CartItemId, MenuItemId};

use crate::error::Result;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::CurrentUser;
use crate::models::{CartEntry, CartItem};
use crate::routes::{Message, message};
use crate::services::cart::CartService;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    menu_item_id: Option<MenuItemId>,
    quantity: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCartRequest {
    quantity: Option<i64>,
}

/// `GET /cart`
pub async fn show(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<CartEntry>>> {
    Ok(Json(CartService::new(state.store()).contents(user.id).await?))
}

/// `POST /cart`
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(body): ApiJson<AddToCartRequest>,
) -> Result<(StatusCode, Json<CartItem>)> {
    let row = CartService::new(state.store())
        .add(user.id, body.menu_item_id, body.quantity)
        .await?;

    Ok((StatusCode::CREATED, Json(row)))
}

/// `PUT /cart/{id}`
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<CartItemId>,
    ApiJson(body): ApiJson<UpdateCartRequest>,
) -> Result<Json<CartItem>> {
    let row = CartService::new(state.store())
        .update(user.id, id, body.quantity)
        .await?;

    Ok(Json(row))
}

/// `DELETE /cart/{id}`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<CartItemId>,
) -> Result<Json<Message>> {
    CartService::new(state.store()).remove(user.id, id).await?;
    Ok(message("Cart item removed"))
}
