//! Order lifecycle: creation, queries, cancellation, status updates.
//!
//! Orders are created either from the caller's cart (checkout) or from a
//! client-submitted list of lines (direct submission). Checkout snapshots
//! current menu prices; direct submission takes the client's prices as
//! given. Both compute the total with [`platter_core::order_total`] via
//! [`NewOrder::new`], which also refuses amounts the store cannot hold to the
//! cent. For submitted lines that is the client's fault (400); for checkout
//! the prices came from the catalog, so it is ours (500).
//!
//! After creation only `status` changes. `Pending` is the initial status and
//! the only one an order can be cancelled from.

use platter_core::{OrderId, OrderStatus, PriceError, UserId};

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::{NewOrder, Order, OrderDetail, OrderLine, User};
use crate::services::non_blank;

const ORDER_NOT_FOUND: &str = "Order not found";

fn order_not_found() -> AppError {
    AppError::NotFound(ORDER_NOT_FOUND.to_owned())
}

fn rejected_amount(e: &PriceError) -> AppError {
    match e {
        PriceError::Overflow | PriceError::OutOfRange(_) => {
            AppError::BadRequest("Order total is too large".to_owned())
        }
        other => AppError::BadRequest(other.to_string()),
    }
}

/// Order service.
pub struct OrderService<'a> {
    store: &'a dyn Store,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Turn the caller's cart into an order, then empty the cart.
    ///
    /// Lines carry each menu item's current price. The delivery address is
    /// `address` if given, else the caller's profile address.
    ///
    /// Creating the order and clearing the cart are separate writes. If the
    /// clear fails the order stays and the error is returned.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for an empty cart and
    /// `AppError::Database` if either write fails.
    #[tracing::instrument(skip(self, user, address), fields(user_id = %user.id))]
    pub async fn checkout(&self, user: &User, address: Option<String>) -> Result<Order> {
        let entries = self.store.cart_entries(user.id).await?;
        if entries.is_empty() {
            return Err(AppError::BadRequest("Cart is empty".to_owned()));
        }

        let lines = entries
            .into_iter()
            .map(|entry| OrderLine {
                menu_item_id: entry.menu_item.id,
                quantity: entry.quantity,
                price: entry.menu_item.price,
            })
            .collect();
        let address = non_blank(address).or_else(|| user.address.clone());
        let new_order = NewOrder::new(user.id, lines, address)
            .map_err(|e| AppError::Internal(format!("cart total: {e}")))?;

        let order = self.store.create_order(new_order).await?;

        if let Err(e) = self.store.clear_cart(user.id).await {
            tracing::error!(
                order_id = %order.id,
                error = %e,
                "Order created but cart was not cleared"
            );
            return Err(e.into());
        }

        tracing::info!(order_id = %order.id, total = %order.total, "Order placed from cart");
        Ok(order)
    }

    /// Store an order exactly as the client described it.
    ///
    /// Prices are not checked against the catalog and the cart is left
    /// alone.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if `items` is empty, `address` is
    /// blank, or a price is not whole cents within the stored range.
    #[tracing::instrument(skip(self, items, address))]
    pub async fn submit(
        &self,
        user: UserId,
        items: Vec<OrderLine>,
        address: Option<String>,
    ) -> Result<Order> {
        let address = non_blank(address);
        if items.is_empty() || address.is_none() {
            return Err(AppError::BadRequest(
                "Please include all required fields".to_owned(),
            ));
        }

        let new_order =
            NewOrder::new(user, items, address).map_err(|e| rejected_amount(&e))?;
        let order = self.store.create_order(new_order).await?;

        tracing::info!(order_id = %order.id, total = %order.total, "Order submitted");
        Ok(order)
    }

    /// The user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the user has none.
    pub async fn for_user(&self, user: UserId) -> Result<Vec<OrderDetail>> {
        let orders = self.store.orders_for_user(user).await?;
        if orders.is_empty() {
            return Err(AppError::NotFound(
                "No orders found for this user".to_owned(),
            ));
        }
        Ok(orders)
    }

    /// One of the user's orders.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if it does not exist or is not theirs.
    pub async fn one_for_user(&self, user: UserId, id: OrderId) -> Result<OrderDetail> {
        self.store
            .order_detail_for_user(user, id)
            .await?
            .ok_or_else(order_not_found)
    }

    /// Every order, newest first, with buyer details.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the store fails.
    pub async fn all(&self) -> Result<Vec<OrderDetail>> {
        Ok(self.store.all_orders().await?)
    }

    /// Cancel a pending order.
    ///
    /// Owners may cancel their own orders and admins any order. For anyone
    /// else the order does not exist.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the order is absent or not visible to
    /// the caller, and `AppError::BadRequest` if it is not `Pending`.
    #[tracing::instrument(skip(self, caller), fields(user_id = %caller.id))]
    pub async fn cancel(&self, caller: &User, id: OrderId) -> Result<()> {
        let order = self
            .store
            .order(id)
            .await?
            .filter(|order| caller.is_admin || order.user_id == caller.id)
            .ok_or_else(order_not_found)?;

        let not_pending =
            || AppError::BadRequest("Cannot cancel order that is not pending".to_owned());
        if !order.status.is_pending() {
            return Err(not_pending());
        }

        // Conditional on the status read above, so a concurrent update wins.
        let cancelled = self
            .store
            .transition_order_status(id, &OrderStatus::pending(), &OrderStatus::cancelled())
            .await?;
        if !cancelled {
            return Err(not_pending());
        }

        tracing::info!(
            order_id = %id,
            by_admin = caller.is_admin && order.user_id != caller.id,
            "Order cancelled"
        );
        Ok(())
    }

    /// Overwrite an order's status. Any non-empty value is accepted.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for a missing status and
    /// `AppError::NotFound` if the order does not exist.
    pub async fn set_status(&self, id: OrderId, status: Option<&str>) -> Result<Order> {
        let status = status
            .and_then(OrderStatus::parse)
            .ok_or_else(|| AppError::BadRequest("Please include a status".to_owned()))?;

        let order = self
            .store
            .set_order_status(id, &status)
            .await?
            .ok_or_else(order_not_found)?;

        tracing::info!(order_id = %id, status = %order.status, "Order status updated");
        Ok(order)
    }

    /// Remove an order entirely.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the order does not exist.
    pub async fn delete(&self, id: OrderId) -> Result<()> {
        if self.store.delete_order(id).await? {
            tracing::info!(order_id = %id, "Order deleted");
            Ok(())
        } else {
            Err(order_not_found())
        }
    }
}
