//! Catalog-wide menu handlers.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use platter_core::MenuItemId;

use crate::error::Result;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::CurrentUser;
use crate::models::MenuItem;
use crate::services::catalog::CatalogService;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RateRequest {
    rating: Option<i64>,
}

/// `GET /menu`
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<MenuItem>>> {
    Ok(Json(CatalogService::new(state.store()).all_menu_items().await?))
}

/// `POST /menu/{id}/rate`
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn rate(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<MenuItemId>,
    ApiJson(body): ApiJson<RateRequest>,
) -> Result<Json<MenuItem>> {
    let item = CatalogService::new(state.store())
        .rate(id, user.id, body.rating)
        .await?;

    Ok(Json(item))
}
