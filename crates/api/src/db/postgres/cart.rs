//! Cart queries.

use async_trait::async_trait;

use platter_core::{CartItemId, MenuItemId, Price, Quantity, RestaurantId, UserId};

use super::PgStore;
use crate::db::{CartStore, RepositoryError};
use crate::models::{CartEntry, CartItem, MenuItemSummary};

#[derive(sqlx::FromRow)]
struct CartItemRow {
    id: CartItemId,
    user_id: UserId,
    menu_item_id: MenuItemId,
    quantity: Quantity,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            menu_item_id: row.menu_item_id,
            quantity: row.quantity,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CartEntryRow {
    id: CartItemId,
    user_id: UserId,
    quantity: Quantity,
    menu_item_id: MenuItemId,
    restaurant_id: RestaurantId,
    name: String,
    description: String,
    price: Price,
    image: String,
    average_rating: f64,
}

impl From<CartEntryRow> for CartEntry {
    fn from(row: CartEntryRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            quantity: row.quantity,
            menu_item: MenuItemSummary {
                id: row.menu_item_id,
                restaurant_id: row.restaurant_id,
                name: row.name,
                description: row.description,
                price: row.price,
                image: row.image,
                average_rating: row.average_rating,
            },
        }
    }
}

#[async_trait]
impl CartStore for PgStore {
    async fn cart_entries(&self, user: UserId) -> Result<Vec<CartEntry>, RepositoryError> {
        let rows: Vec<CartEntryRow> = sqlx::query_as(
            r"
            SELECT c.id, c.user_id, c.quantity,
                   m.id AS menu_item_id, m.restaurant_id, m.name, m.description,
                   m.price, m.image, m.average_rating
            FROM cart_items c
            JOIN menu_items m ON m.id = c.menu_item_id
            WHERE c.user_id = $1
            ORDER BY c.id
            ",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CartEntry::from).collect())
    }

    async fn add_to_cart(
        &self,
        user: UserId,
        item: MenuItemId,
        quantity: Quantity,
    ) -> Result<CartItem, RepositoryError> {
        // Merge into the existing (user, item) row, saturating at INTEGER max.
        let row: CartItemRow = sqlx::query_as(
            r"
            INSERT INTO cart_items (user_id, menu_item_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, menu_item_id) DO UPDATE
            SET quantity =
                LEAST(cart_items.quantity::BIGINT + EXCLUDED.quantity, 2147483647)::INTEGER
            RETURNING id, user_id, menu_item_id, quantity
            ",
        )
        .bind(user)
        .bind(item)
        .bind(quantity)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // The menu item was deleted between the existence check and the insert.
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })?;

        Ok(row.into())
    }

    async fn update_cart_item(
        &self,
        user: UserId,
        id: CartItemId,
        quantity: Quantity,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let row: Option<CartItemRow> = sqlx::query_as(
            r"
            UPDATE cart_items
            SET quantity = $3
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, menu_item_id, quantity
            ",
        )
        .bind(id)
        .bind(user)
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CartItem::from))
    }

    async fn remove_cart_item(
        &self,
        user: UserId,
        id: CartItemId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear_cart(&self, user: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
