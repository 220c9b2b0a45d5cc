//! Orders and their line snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use platter_core::{
    Email, MenuItemId, OrderId, OrderStatus, Price, PriceError, Quantity, UserId, order_total,
};

use super::catalog::MenuItemSummary;

/// One order line, snapshotted at creation.
///
/// `price` is the unit price at the time of ordering and never follows later
/// catalog changes. `menu_item_id` is a plain reference: the menu item may
/// since have been deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    #[serde(rename = "menuItem")]
    pub menu_item_id: MenuItemId,
    pub quantity: Quantity,
    pub price: Price,
}

/// A placed order. Immutable apart from `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    #[serde(rename = "user")]
    pub user_id: UserId,
    pub items: Vec<OrderLine>,
    pub total: Price,
    pub address: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// An order about to be stored.
///
/// Built only through [`NewOrder::new`], so `total` always equals the sum of
/// its lines and every amount is stored exactly, without rounding.
#[derive(Debug, Clone)]
pub struct NewOrder {
    user_id: UserId,
    items: Vec<OrderLine>,
    total: Price,
    address: Option<String>,
}

impl NewOrder {
    /// Build a pending order, computing its total from `items`.
    ///
    /// # Errors
    ///
    /// Returns a [`PriceError`] if a line price or the total is not whole
    /// cents within [`Price::MAX_STORED`], or if the total overflows.
    pub fn new(
        user_id: UserId,
        items: Vec<OrderLine>,
        address: Option<String>,
    ) -> Result<Self, PriceError> {
        let total = order_total(items.iter().map(|line| (line.price, line.quantity)))?;
        for line in &items {
            line.price.ensure_storable()?;
        }
        let total = total.ensure_storable()?;

        Ok(Self {
            user_id,
            items,
            total,
            address,
        })
    }

    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn items(&self) -> &[OrderLine] {
        &self.items
    }

    #[must_use]
    pub const fn total(&self) -> Price {
        self.total
    }

    #[must_use]
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// Materialize the stored order once the store has assigned an id.
    #[must_use]
    pub fn into_order(self, id: OrderId, created_at: DateTime<Utc>) -> Order {
        Order {
            id,
            user_id: self.user_id,
            items: self.items,
            total: self.total,
            address: self.address,
            status: OrderStatus::pending(),
            created_at,
        }
    }
}

/// The buyer fields shown to administrators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Buyer {
    pub id: UserId,
    pub name: String,
    pub email: Email,
}

/// Who placed an order: a bare id for the owner's own views, the buyer's
/// contact details for admin listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OrderOwner {
    Id(UserId),
    Buyer(Buyer),
}

impl OrderOwner {
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        match self {
            Self::Id(id) => *id,
            Self::Buyer(buyer) => buyer.id,
        }
    }
}

/// An order line joined with its menu item, if it still exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineDetail {
    pub menu_item_id: MenuItemId,
    /// `None` once the menu item has been deleted from the catalog.
    pub menu_item: Option<MenuItemSummary>,
    pub quantity: Quantity,
    pub price: Price,
}

/// An order with joined line details, as returned by the query endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    pub id: OrderId,
    pub user: OrderOwner,
    pub items: Vec<OrderLineDetail>,
    pub total: Price,
    pub address: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}
