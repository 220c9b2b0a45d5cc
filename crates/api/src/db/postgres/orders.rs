//! Order queries.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use platter_core::{
    Email, MenuItemId, OrderId, OrderStatus, Price, Quantity, RestaurantId, UserId,
};

use super::PgStore;
use crate::db::{OrderStore, RepositoryError};
use crate::models::{
    Buyer, MenuItemSummary, NewOrder, Order, OrderDetail, OrderLine, OrderLineDetail, OrderOwner,
};

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    total: Price,
    address: Option<String>,
    status: OrderStatus,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OrderWithBuyerRow {
    #[sqlx(flatten)]
    order: OrderRow,
    buyer_name: String,
    buyer_email: String,
}

#[derive(sqlx::FromRow)]
struct OrderLineRow {
    menu_item_id: MenuItemId,
    quantity: Quantity,
    price: Price,
}

/// An order line left-joined with the catalog; the `item_*` columns are
/// `NULL` once the menu item is gone.
#[derive(sqlx::FromRow)]
struct OrderLineDetailRow {
    order_id: OrderId,
    menu_item_id: MenuItemId,
    quantity: Quantity,
    price: Price,
    item_id: Option<MenuItemId>,
    item_restaurant_id: Option<RestaurantId>,
    item_name: Option<String>,
    item_description: Option<String>,
    item_price: Option<Price>,
    item_image: Option<String>,
    item_average_rating: Option<f64>,
}

impl OrderLineDetailRow {
    fn into_detail(self) -> OrderLineDetail {
        let menu_item = match (
            self.item_id,
            self.item_restaurant_id,
            self.item_name,
            self.item_description,
            self.item_price,
            self.item_image,
            self.item_average_rating,
        ) {
            (
                Some(id),
                Some(restaurant_id),
                Some(name),
                Some(description),
                Some(price),
                Some(image),
                Some(average_rating),
            ) => Some(MenuItemSummary {
                id,
                restaurant_id,
                name,
                description,
                price,
                image,
                average_rating,
            }),
            _ => None,
        };

        OrderLineDetail {
            menu_item_id: self.menu_item_id,
            menu_item,
            quantity: self.quantity,
            price: self.price,
        }
    }
}

impl PgStore {
    async fn load_lines(&self, id: OrderId) -> Result<Vec<OrderLine>, RepositoryError> {
        let rows: Vec<OrderLineRow> = sqlx::query_as(
            r"
            SELECT menu_item_id, quantity, price
            FROM order_items
            WHERE order_id = $1
            ORDER BY line_no
            ",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| OrderLine {
                menu_item_id: row.menu_item_id,
                quantity: row.quantity,
                price: row.price,
            })
            .collect())
    }

    async fn load_line_details(
        &self,
        ids: &[OrderId],
    ) -> Result<HashMap<OrderId, Vec<OrderLineDetail>>, RepositoryError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let raw_ids: Vec<i32> = ids.iter().map(OrderId::as_i32).collect();
        let rows: Vec<OrderLineDetailRow> = sqlx::query_as(
            r"
            SELECT oi.order_id, oi.menu_item_id, oi.quantity, oi.price,
                   m.id AS item_id,
                   m.restaurant_id AS item_restaurant_id,
                   m.name AS item_name,
                   m.description AS item_description,
                   m.price AS item_price,
                   m.image AS item_image,
                   m.average_rating AS item_average_rating
            FROM order_items oi
            LEFT JOIN menu_items m ON m.id = oi.menu_item_id
            WHERE oi.order_id = ANY($1)
            ORDER BY oi.order_id, oi.line_no
            ",
        )
        .bind(raw_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<OrderId, Vec<OrderLineDetail>> = HashMap::new();
        for row in rows {
            grouped.entry(row.order_id).or_default().push(row.into_detail());
        }
        Ok(grouped)
    }

    async fn details_for(
        &self,
        rows: Vec<(OrderRow, OrderOwner)>,
    ) -> Result<Vec<OrderDetail>, RepositoryError> {
        let ids: Vec<OrderId> = rows.iter().map(|(row, _)| row.id).collect();
        let mut lines = self.load_line_details(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|(row, user)| OrderDetail {
                id: row.id,
                user,
                items: lines.remove(&row.id).unwrap_or_default(),
                total: row.total,
                address: row.address,
                status: row.status,
                created_at: row.created_at,
            })
            .collect())
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn create_order(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let (id, created_at): (OrderId, DateTime<Utc>) = sqlx::query_as(
            r"
            INSERT INTO orders (user_id, total, address, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id, created_at
            ",
        )
        .bind(order.user_id())
        .bind(order.total())
        .bind(order.address())
        .bind(OrderStatus::pending())
        .fetch_one(&mut *tx)
        .await?;

        for (line_no, line) in (0_i32..).zip(order.items()) {
            sqlx::query(
                r"
                INSERT INTO order_items (order_id, line_no, menu_item_id, quantity, price)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(id)
            .bind(line_no)
            .bind(line.menu_item_id)
            .bind(line.quantity)
            .bind(line.price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(order.into_order(id, created_at))
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(
            "SELECT id, user_id, total, address, status, created_at FROM orders WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let items = self.load_lines(row.id).await?;

        Ok(Some(Order {
            id: row.id,
            user_id: row.user_id,
            items,
            total: row.total,
            address: row.address,
            status: row.status,
            created_at: row.created_at,
        }))
    }

    async fn orders_for_user(&self, user: UserId) -> Result<Vec<OrderDetail>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(
            r"
            SELECT id, user_id, total, address, status, created_at
            FROM orders
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        let rows = rows
            .into_iter()
            .map(|row| {
                let owner = OrderOwner::Id(row.user_id);
                (row, owner)
            })
            .collect();
        self.details_for(rows).await
    }

    async fn order_detail_for_user(
        &self,
        user: UserId,
        id: OrderId,
    ) -> Result<Option<OrderDetail>, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(
            r"
            SELECT id, user_id, total, address, status, created_at
            FROM orders
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(id)
        .bind(user)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let owner = OrderOwner::Id(row.user_id);
        Ok(self.details_for(vec![(row, owner)]).await?.pop())
    }

    async fn all_orders(&self) -> Result<Vec<OrderDetail>, RepositoryError> {
        let rows: Vec<OrderWithBuyerRow> = sqlx::query_as(
            r"
            SELECT o.id, o.user_id, o.total, o.address, o.status, o.created_at,
                   u.name AS buyer_name, u.email AS buyer_email
            FROM orders o
            JOIN users u ON u.id = o.user_id
            ORDER BY o.created_at DESC, o.id DESC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        let rows = rows
            .into_iter()
            .map(|row| {
                let email = Email::parse(&row.buyer_email).map_err(|e| {
                    RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
                })?;
                let owner = OrderOwner::Buyer(Buyer {
                    id: row.order.user_id,
                    name: row.buyer_name,
                    email,
                });
                Ok((row.order, owner))
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;
        self.details_for(rows).await
    }

    async fn set_order_status(
        &self,
        id: OrderId,
        status: &OrderStatus,
    ) -> Result<Option<Order>, RepositoryError> {
        let result = sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.order(id).await
    }

    async fn transition_order_status(
        &self,
        id: OrderId,
        from: &OrderStatus,
        to: &OrderStatus,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE orders SET status = $3 WHERE id = $1 AND status = $2")
            .bind(id)
            .bind(from)
            .bind(to)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_order(&self, id: OrderId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
