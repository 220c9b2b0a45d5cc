//! Restaurant, menu item and rating queries.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgConnection;

use platter_core::{MenuItemId, Price, Rating, RestaurantId, UserId};

use super::PgStore;
use crate::db::{CatalogStore, RepositoryError};
use crate::models::{
    MenuItem, MenuItemPatch, MenuItemRating, NewMenuItem, NewRestaurant, Restaurant,
    RestaurantPatch,
};

#[derive(sqlx::FromRow)]
struct RestaurantRow {
    id: RestaurantId,
    name: String,
    cuisine: String,
    image: String,
    is_late_night: bool,
    location: String,
}

impl From<RestaurantRow> for Restaurant {
    fn from(row: RestaurantRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            cuisine: row.cuisine,
            image: row.image,
            is_late_night: row.is_late_night,
            location: row.location,
        }
    }
}

#[derive(sqlx::FromRow)]
struct MenuItemRow {
    id: MenuItemId,
    restaurant_id: RestaurantId,
    name: String,
    description: String,
    price: Price,
    image: String,
    average_rating: f64,
}

impl MenuItemRow {
    fn into_item(self, ratings: Vec<MenuItemRating>) -> MenuItem {
        MenuItem {
            id: self.id,
            restaurant_id: self.restaurant_id,
            name: self.name,
            description: self.description,
            price: self.price,
            image: self.image,
            ratings,
            average_rating: self.average_rating,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RatingRow {
    menu_item_id: MenuItemId,
    user_id: UserId,
    rating: Rating,
}

/// Load the ratings of the given items, grouped by item in submission order.
async fn load_ratings(
    conn: &mut PgConnection,
    ids: &[MenuItemId],
) -> Result<HashMap<MenuItemId, Vec<MenuItemRating>>, RepositoryError> {
    let raw_ids: Vec<i32> = ids.iter().map(MenuItemId::as_i32).collect();

    let rows: Vec<RatingRow> = sqlx::query_as(
        r"
        SELECT menu_item_id, user_id, rating
        FROM menu_item_ratings
        WHERE menu_item_id = ANY($1)
        ORDER BY menu_item_id, position
        ",
    )
    .bind(raw_ids)
    .fetch_all(conn)
    .await?;

    let mut grouped: HashMap<MenuItemId, Vec<MenuItemRating>> = HashMap::new();
    for row in rows {
        grouped.entry(row.menu_item_id).or_default().push(MenuItemRating {
            user: row.user_id,
            rating: row.rating,
        });
    }
    Ok(grouped)
}

impl PgStore {
    async fn attach_ratings(
        &self,
        rows: Vec<MenuItemRow>,
    ) -> Result<Vec<MenuItem>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<MenuItemId> = rows.iter().map(|r| r.id).collect();
        let mut conn = self.pool.acquire().await?;
        let mut ratings = load_ratings(&mut *conn, &ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let item_ratings = ratings.remove(&row.id).unwrap_or_default();
                row.into_item(item_ratings)
            })
            .collect())
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn list_restaurants(&self) -> Result<Vec<Restaurant>, RepositoryError> {
        let rows: Vec<RestaurantRow> = sqlx::query_as(
            "SELECT id, name, cuisine, image, is_late_night, location FROM restaurants ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Restaurant::from).collect())
    }

    async fn restaurant(&self, id: RestaurantId) -> Result<Option<Restaurant>, RepositoryError> {
        let row: Option<RestaurantRow> = sqlx::query_as(
            "SELECT id, name, cuisine, image, is_late_night, location FROM restaurants WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Restaurant::from))
    }

    async fn create_restaurant(&self, new: NewRestaurant) -> Result<Restaurant, RepositoryError> {
        let row: RestaurantRow = sqlx::query_as(
            r"
            INSERT INTO restaurants (name, cuisine, image, is_late_night, location)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, cuisine, image, is_late_night, location
            ",
        )
        .bind(&new.name)
        .bind(&new.cuisine)
        .bind(&new.image)
        .bind(new.is_late_night)
        .bind(&new.location)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn update_restaurant(
        &self,
        id: RestaurantId,
        patch: RestaurantPatch,
    ) -> Result<Option<Restaurant>, RepositoryError> {
        let row: Option<RestaurantRow> = sqlx::query_as(
            r"
            UPDATE restaurants
            SET name = COALESCE($2, name),
                cuisine = COALESCE($3, cuisine),
                image = COALESCE($4, image),
                is_late_night = COALESCE($5, is_late_night),
                location = COALESCE($6, location)
            WHERE id = $1
            RETURNING id, name, cuisine, image, is_late_night, location
            ",
        )
        .bind(id)
        .bind(patch.name)
        .bind(patch.cuisine)
        .bind(patch.image)
        .bind(patch.is_late_night)
        .bind(patch.location)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Restaurant::from))
    }

    async fn delete_restaurant(&self, id: RestaurantId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM restaurants WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_menu_items_for(
        &self,
        restaurant: RestaurantId,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM menu_items WHERE restaurant_id = $1")
            .bind(restaurant)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn list_menu_items(
        &self,
        restaurant: Option<RestaurantId>,
    ) -> Result<Vec<MenuItem>, RepositoryError> {
        let rows: Vec<MenuItemRow> = sqlx::query_as(
            r"
            SELECT id, restaurant_id, name, description, price, image, average_rating
            FROM menu_items
            WHERE $1::INTEGER IS NULL OR restaurant_id = $1
            ORDER BY id
            ",
        )
        .bind(restaurant.map(|r| r.as_i32()))
        .fetch_all(&self.pool)
        .await?;

        self.attach_ratings(rows).await
    }

    async fn menu_item(&self, id: MenuItemId) -> Result<Option<MenuItem>, RepositoryError> {
        let row: Option<MenuItemRow> = sqlx::query_as(
            r"
            SELECT id, restaurant_id, name, description, price, image, average_rating
            FROM menu_items
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.attach_ratings(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn create_menu_item(&self, new: NewMenuItem) -> Result<MenuItem, RepositoryError> {
        let row: MenuItemRow = sqlx::query_as(
            r"
            INSERT INTO menu_items (restaurant_id, name, description, price, image)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, restaurant_id, name, description, price, image, average_rating
            ",
        )
        .bind(new.restaurant_id)
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.price)
        .bind(&new.image)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_item(Vec::new()))
    }

    async fn update_menu_item(
        &self,
        restaurant: RestaurantId,
        id: MenuItemId,
        patch: MenuItemPatch,
    ) -> Result<Option<MenuItem>, RepositoryError> {
        let row: Option<MenuItemRow> = sqlx::query_as(
            r"
            UPDATE menu_items
            SET name = COALESCE($3, name),
                description = COALESCE($4, description),
                price = COALESCE($5, price),
                image = COALESCE($6, image)
            WHERE id = $1 AND restaurant_id = $2
            RETURNING id, restaurant_id, name, description, price, image, average_rating
            ",
        )
        .bind(id)
        .bind(restaurant)
        .bind(patch.name)
        .bind(patch.description)
        .bind(patch.price)
        .bind(patch.image)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.attach_ratings(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn delete_menu_item(
        &self,
        restaurant: RestaurantId,
        id: MenuItemId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM menu_items WHERE id = $1 AND restaurant_id = $2")
            .bind(id)
            .bind(restaurant)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn rate_menu_item(
        &self,
        id: MenuItemId,
        user: UserId,
        rating: Rating,
    ) -> Result<Option<MenuItem>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes concurrent ratings of the same item.
        let row: Option<MenuItemRow> = sqlx::query_as(
            r"
            SELECT id, restaurant_id, name, description, price, image, average_rating
            FROM menu_items
            WHERE id = $1
            FOR UPDATE
            ",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut ratings = load_ratings(&mut *tx, &[id]).await?;
        let mut item = row.into_item(ratings.remove(&id).unwrap_or_default());
        item.apply_rating(user, rating);

        sqlx::query("DELETE FROM menu_item_ratings WHERE menu_item_id = $1 AND user_id = $2")
            .bind(id)
            .bind(user)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r"
            INSERT INTO menu_item_ratings (menu_item_id, user_id, rating, position)
            VALUES (
                $1, $2, $3,
                COALESCE(
                    (SELECT MAX(position) + 1 FROM menu_item_ratings WHERE menu_item_id = $1),
                    0
                )
            )
            ",
        )
        .bind(id)
        .bind(user)
        .bind(rating)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE menu_items SET average_rating = $2 WHERE id = $1")
            .bind(id)
            .bind(item.average_rating)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(item))
    }
}
