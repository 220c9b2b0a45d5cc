//! Restaurant and menu management handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use platter_core::{MenuItemId, Price, RestaurantId};

use crate::error::Result;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::AdminUser;
use crate::models::{MenuItem, Restaurant};
use crate::routes::{Message, message};
use crate::services::catalog::{CatalogService, MenuItemInput, RestaurantInput};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantRequest {
    name: Option<String>,
    cuisine: Option<String>,
    image: Option<String>,
    is_late_night: Option<bool>,
    location: Option<String>,
}

impl From<RestaurantRequest> for RestaurantInput {
    fn from(body: RestaurantRequest) -> Self {
        Self {
            name: body.name,
            cuisine: body.cuisine,
            image: body.image,
            is_late_night: body.is_late_night,
            location: body.location,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MenuItemRequest {
    name: Option<String>,
    description: Option<String>,
    price: Option<Price>,
    image: Option<String>,
}

impl From<MenuItemRequest> for MenuItemInput {
    fn from(body: MenuItemRequest) -> Self {
        Self {
            name: body.name,
            description: body.description,
            price: body.price,
            image: body.image,
        }
    }
}

/// `GET /restaurants`
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Restaurant>>> {
    Ok(Json(CatalogService::new(state.store()).restaurants().await?))
}

/// `GET /restaurants/{id}`
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RestaurantId>,
) -> Result<Json<Restaurant>> {
    Ok(Json(CatalogService::new(state.store()).restaurant(id).await?))
}

/// `POST /restaurants`
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(body): ApiJson<RestaurantRequest>,
) -> Result<(StatusCode, Json<Restaurant>)> {
    let restaurant = CatalogService::new(state.store())
        .create_restaurant(body.into())
        .await?;

    Ok((StatusCode::CREATED, Json(restaurant)))
}

/// `PUT /restaurants/{id}`
#[instrument(skip(state, _admin, body))]
pub async fn update(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<RestaurantId>,
    ApiJson(body): ApiJson<RestaurantRequest>,
) -> Result<Json<Restaurant>> {
    let restaurant = CatalogService::new(state.store())
        .update_restaurant(id, body.into())
        .await?;

    Ok(Json(restaurant))
}

/// `DELETE /restaurants/{id}`
#[instrument(skip(state, _admin))]
pub async fn destroy(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<RestaurantId>,
) -> Result<Json<Message>> {
    CatalogService::new(state.store()).delete_restaurant(id).await?;
    Ok(message("Restaurant deleted successfully"))
}

/// `GET /restaurants/{id}/menu`
pub async fn menu(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RestaurantId>,
) -> Result<Json<Vec<MenuItem>>> {
    Ok(Json(CatalogService::new(state.store()).menu(id).await?))
}

/// `POST /restaurants/{id}/menu`
#[instrument(skip(state, _admin, body))]
pub async fn create_menu_item(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<RestaurantId>,
    ApiJson(body): ApiJson<MenuItemRequest>,
) -> Result<(StatusCode, Json<MenuItem>)> {
    let item = CatalogService::new(state.store())
        .create_menu_item(id, body.into())
        .await?;

    Ok((StatusCode::CREATED, Json(item)))
}

/// `PUT /restaurants/{id}/menu/{item_id}`
#[instrument(skip(state, _admin, body))]
pub async fn update_menu_item(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath((restaurant, item)): ApiPath<(RestaurantId, MenuItemId)>,
    ApiJson(body): ApiJson<MenuItemRequest>,
) -> Result<Json<MenuItem>> {
    let item = CatalogService::new(state.store())
        .update_menu_item(restaurant, item, body.into())
        .await?;

    Ok(Json(item))
}

/// `DELETE /restaurants/{id}/menu/{item_id}`
#[instrument(skip(state, _admin))]
pub async fn delete_menu_item(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath((restaurant, item)): ApiPath<(RestaurantId, MenuItemId)>,
) -> Result<Json<Message>> {
    CatalogService::new(state.store())
        .delete_menu_item(restaurant, item)
        .await?;

    Ok(message("Menu item deleted successfully"))
}
