//! Administrator order handlers.

use axum::{Json, extract::State};
use tracing::instrument;

use platter_core::OrderId;

use crate::error::Result;
use crate::extract::ApiPath;
use crate::middleware::AdminUser;
use crate::models::OrderDetail;
use crate::routes::{Message, message};
use crate::services::orders::OrderService;
use crate::state::AppState;

/// `GET /admin/orders` and `GET /orders/admin/all`
pub async fn orders(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<OrderDetail>>> {
    Ok(Json(OrderService::new(state.store()).all().await?))
}

/// `DELETE /admin/orders/{id}`
#[instrument(skip(state, admin), fields(admin_id = %admin.0.id))]
pub async fn delete_order(
    State(state): State<AppState>,
    admin: AdminUser,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<Message>> {
    OrderService::new(state.store()).delete(id).await?;
    Ok(message("Order deleted successfully"))
}
