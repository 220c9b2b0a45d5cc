//! Per-user shopping cart.

use platter_core::{CartItemId, MenuItemId, Quantity, QuantityError, UserId};

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::{CartEntry, CartItem};

const CART_ITEM_NOT_FOUND: &str = "Cart item not found";

fn quantity(value: i64) -> Result<Quantity> {
    Quantity::try_from(value).map_err(|e| match e {
        QuantityError::NotPositive(_) => {
            AppError::BadRequest("Quantity must be at least 1".to_owned())
        }
        QuantityError::TooLarge(_) => AppError::BadRequest("Quantity is too large".to_owned()),
    })
}

/// Cart service.
pub struct CartService<'a> {
    store: &'a dyn Store,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// The user's cart rows with their menu items.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the store fails.
    pub async fn contents(&self, user: UserId) -> Result<Vec<CartEntry>> {
        Ok(self.store.cart_entries(user).await?)
    }

    /// Add a menu item to the cart, merging with an existing row for the
    /// same item. A missing quantity means one.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for a missing item id or a quantity
    /// below one, and `AppError::NotFound` if the menu item does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn add(
        &self,
        user: UserId,
        menu_item: Option<MenuItemId>,
        quantity_requested: Option<i64>,
    ) -> Result<CartItem> {
        let menu_item = menu_item.ok_or_else(|| {
            AppError::BadRequest("Please include all required fields".to_owned())
        })?;
        let quantity = quantity_requested.map_or(Ok(Quantity::ONE), quantity)?;

        let menu_item_not_found = || AppError::NotFound("Menu item not found".to_owned());
        if self.store.menu_item(menu_item).await?.is_none() {
            return Err(menu_item_not_found());
        }

        // The item can still vanish between the check and the write.
        self.store
            .add_to_cart(user, menu_item, quantity)
            .await
            .map_err(|e| match e {
                crate::db::RepositoryError::NotFound => menu_item_not_found(),
                other => other.into(),
            })
    }

    /// Overwrite the quantity of one of the user's rows.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for a quantity below one and
    /// `AppError::NotFound` if the row is not the user's.
    pub async fn update(
        &self,
        user: UserId,
        id: CartItemId,
        quantity_requested: Option<i64>,
    ) -> Result<CartItem> {
        let quantity = quantity(quantity_requested.unwrap_or(0))?;

        self.store
            .update_cart_item(user, id, quantity)
            .await?
            .ok_or_else(|| AppError::NotFound(CART_ITEM_NOT_FOUND.to_owned()))
    }

    /// Remove one of the user's rows.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the row is not the user's.
    pub async fn remove(&self, user: UserId, id: CartItemId) -> Result<()> {
        if self.store.remove_cart_item(user, id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound(CART_ITEM_NOT_FOUND.to_owned()))
        }
    }
}
