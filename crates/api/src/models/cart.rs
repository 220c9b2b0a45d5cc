//! Shopping cart rows.

use serde::Serialize;

use platter_core::{CartItemId, MenuItemId, Price, PriceError, Quantity, UserId, line_total};

use super::catalog::MenuItemSummary;

/// A stored cart row: one (user, menu item) pair and its quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartItemId,
    #[serde(rename = "user")]
    pub user_id: UserId,
    #[serde(rename = "menuItem")]
    pub menu_item_id: MenuItemId,
    pub quantity: Quantity,
}

/// A cart row joined with its menu item's current details.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    pub id: CartItemId,
    #[serde(rename = "user")]
    pub user_id: UserId,
    pub menu_item: MenuItemSummary,
    pub quantity: Quantity,
}

impl CartEntry {
    /// Current menu price times quantity.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Overflow`] if the product exceeds `Decimal`.
    pub fn line_total(&self) -> Result<Price, PriceError> {
        line_total(self.menu_item.price, self.quantity)
    }
}
