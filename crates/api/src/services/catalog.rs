//! Restaurant and menu management.

use platter_core::{MenuItemId, Price, Rating, RestaurantId, UserId};

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::{
    MenuItem, MenuItemPatch, NewMenuItem, NewRestaurant, Restaurant, RestaurantPatch,
};
use crate::services::non_blank;

const RESTAURANT_NOT_FOUND: &str = "Restaurant not found";
const MENU_ITEM_NOT_FOUND: &str = "Menu item not found";
const MISSING_FIELDS: &str = "Please include all required fields";

/// Menu prices are snapshotted into orders, which hold whole cents.
fn storable(price: Price) -> Result<Price> {
    price
        .ensure_storable()
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

/// Restaurant fields as submitted. Blank strings count as missing.
#[derive(Debug, Clone, Default)]
pub struct RestaurantInput {
    pub name: Option<String>,
    pub cuisine: Option<String>,
    pub image: Option<String>,
    pub is_late_night: Option<bool>,
    pub location: Option<String>,
}

/// Menu item fields as submitted. Blank strings count as missing.
#[derive(Debug, Clone, Default)]
pub struct MenuItemInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub image: Option<String>,
}

/// Catalog service.
pub struct CatalogService<'a> {
    store: &'a dyn Store,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Every restaurant.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the store fails.
    pub async fn restaurants(&self) -> Result<Vec<Restaurant>> {
        Ok(self.store.list_restaurants().await?)
    }

    /// One restaurant.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if it does not exist.
    pub async fn restaurant(&self, id: RestaurantId) -> Result<Restaurant> {
        self.store
            .restaurant(id)
            .await?
            .ok_or_else(|| AppError::NotFound(RESTAURANT_NOT_FOUND.to_owned()))
    }

    /// Create a restaurant. `isLateNight` defaults to false.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if a required field is missing.
    pub async fn create_restaurant(&self, input: RestaurantInput) -> Result<Restaurant> {
        let (Some(name), Some(cuisine), Some(image), Some(location)) = (
            non_blank(input.name),
            non_blank(input.cuisine),
            non_blank(input.image),
            non_blank(input.location),
        ) else {
            return Err(AppError::BadRequest(MISSING_FIELDS.to_owned()));
        };

        let restaurant = self
            .store
            .create_restaurant(NewRestaurant {
                name,
                cuisine,
                image,
                is_late_night: input.is_late_night.unwrap_or(false),
                location,
            })
            .await?;

        tracing::info!(restaurant_id = %restaurant.id, "Restaurant created");
        Ok(restaurant)
    }

    /// Update the given fields of a restaurant.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if it does not exist.
    pub async fn update_restaurant(
        &self,
        id: RestaurantId,
        input: RestaurantInput,
    ) -> Result<Restaurant> {
        let patch = RestaurantPatch {
            name: non_blank(input.name),
            cuisine: non_blank(input.cuisine),
            image: non_blank(input.image),
            is_late_night: input.is_late_night,
            location: non_blank(input.location),
        };

        self.store
            .update_restaurant(id, patch)
            .await?
            .ok_or_else(|| AppError::NotFound(RESTAURANT_NOT_FOUND.to_owned()))
    }

    /// Delete a restaurant, then its menu.
    ///
    /// The two deletes are separate writes. If the second fails the
    /// restaurant is already gone, its menu items are left orphaned, and the
    /// error is returned.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the restaurant does not exist and
    /// `AppError::Database` if either delete fails.
    pub async fn delete_restaurant(&self, id: RestaurantId) -> Result<u64> {
        if !self.store.delete_restaurant(id).await? {
            return Err(AppError::NotFound(RESTAURANT_NOT_FOUND.to_owned()));
        }

        let removed = self.store.delete_menu_items_for(id).await.map_err(|e| {
            tracing::error!(
                restaurant_id = %id,
                error = %e,
                "Restaurant deleted but its menu items were not"
            );
            e
        })?;

        tracing::info!(restaurant_id = %id, menu_items = removed, "Restaurant deleted");
        Ok(removed)
    }

    /// Menu of one restaurant. Empty for unknown restaurants.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the store fails.
    pub async fn menu(&self, restaurant: RestaurantId) -> Result<Vec<MenuItem>> {
        Ok(self.store.list_menu_items(Some(restaurant)).await?)
    }

    /// Every menu item in the catalog.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the store fails.
    pub async fn all_menu_items(&self) -> Result<Vec<MenuItem>> {
        Ok(self.store.list_menu_items(None).await?)
    }

    /// Add a menu item to a restaurant.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the restaurant does not exist and
    /// `AppError::BadRequest` if a required field is missing or the price is
    /// not whole cents.
    pub async fn create_menu_item(
        &self,
        restaurant: RestaurantId,
        input: MenuItemInput,
    ) -> Result<MenuItem> {
        self.restaurant(restaurant).await?;

        let (Some(name), Some(description), Some(price), Some(image)) = (
            non_blank(input.name),
            non_blank(input.description),
            input.price,
            non_blank(input.image),
        ) else {
            return Err(AppError::BadRequest(MISSING_FIELDS.to_owned()));
        };
        let price = storable(price)?;

        let item = self
            .store
            .create_menu_item(NewMenuItem {
                restaurant_id: restaurant,
                name,
                description,
                price,
                image,
            })
            .await?;

        tracing::info!(menu_item_id = %item.id, restaurant_id = %restaurant, "Menu item created");
        Ok(item)
    }

    /// Update the given fields of a restaurant's menu item.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` unless the item exists under `restaurant`
    /// and `AppError::BadRequest` if a new price is not whole cents.
    pub async fn update_menu_item(
        &self,
        restaurant: RestaurantId,
        id: MenuItemId,
        input: MenuItemInput,
    ) -> Result<MenuItem> {
        let patch = MenuItemPatch {
            name: non_blank(input.name),
            description: non_blank(input.description),
            price: input.price.map(storable).transpose()?,
            image: non_blank(input.image),
        };

        self.store
            .update_menu_item(restaurant, id, patch)
            .await?
            .ok_or_else(|| AppError::NotFound(MENU_ITEM_NOT_FOUND.to_owned()))
    }

    /// Delete a restaurant's menu item.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` unless the item exists under `restaurant`.
    pub async fn delete_menu_item(&self, restaurant: RestaurantId, id: MenuItemId) -> Result<()> {
        if self.store.delete_menu_item(restaurant, id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound(MENU_ITEM_NOT_FOUND.to_owned()))
        }
    }

    /// Record a user's 1-5 rating of a menu item, replacing their previous
    /// one, and return the item with its new average.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for a missing or out-of-range rating
    /// and `AppError::NotFound` if the item does not exist.
    pub async fn rate(
        &self,
        id: MenuItemId,
        user: UserId,
        rating: Option<i64>,
    ) -> Result<MenuItem> {
        let rating = rating
            .and_then(|r| Rating::try_from(r).ok())
            .ok_or_else(|| {
                AppError::BadRequest("Rating must be an integer between 1 and 5".to_owned())
            })?;

        self.store
            .rate_menu_item(id, user, rating)
            .await?
            .ok_or_else(|| AppError::NotFound(MENU_ITEM_NOT_FOUND.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::{CatalogStore, FailPoint, MemoryStore};

    fn restaurant_input() -> RestaurantInput {
        RestaurantInput {
            name: Some("Noodle Bar".to_owned()),
            cuisine: Some("Thai".to_owned()),
            image: Some("bar.jpg".to_owned()),
            is_late_night: None,
            location: Some("Main St".to_owned()),
        }
    }

    fn item_input(name: &str) -> MenuItemInput {
        MenuItemInput {
            name: Some(name.to_owned()),
            description: Some("House special".to_owned()),
            price: Some(Price::from_minor_units(950)),
            image: Some("dish.jpg".to_owned()),
        }
    }

    #[tokio::test]
    async fn test_create_restaurant_defaults_late_night() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);

        let restaurant = catalog.create_restaurant(restaurant_input()).await.unwrap();
        assert!(!restaurant.is_late_night);
    }

    #[tokio::test]
    async fn test_create_restaurant_requires_fields() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);

        let input = RestaurantInput {
            location: Some("   ".to_owned()),
            ..restaurant_input()
        };
        assert!(matches!(
            catalog.create_restaurant(input).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_restaurant_removes_its_menu() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);
        let doomed = catalog.create_restaurant(restaurant_input()).await.unwrap();
        let kept = catalog.create_restaurant(restaurant_input()).await.unwrap();
        for name in ["A", "B", "C"] {
            catalog.create_menu_item(doomed.id, item_input(name)).await.unwrap();
        }
        catalog.create_menu_item(kept.id, item_input("D")).await.unwrap();

        assert_eq!(catalog.delete_restaurant(doomed.id).await.unwrap(), 3);

        assert!(catalog.menu(doomed.id).await.unwrap().is_empty());
        assert_eq!(catalog.all_menu_items().await.unwrap().len(), 1);
        assert!(matches!(
            catalog.restaurant(doomed.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_restaurant_partial_failure_orphans_menu() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);
        let restaurant = catalog.create_restaurant(restaurant_input()).await.unwrap();
        catalog.create_menu_item(restaurant.id, item_input("A")).await.unwrap();

        store.fail_on(FailPoint::DeleteMenuItems);
        assert!(matches!(
            catalog.delete_restaurant(restaurant.id).await,
            Err(AppError::Database(_))
        ));

        assert!(store.restaurant(restaurant.id).await.unwrap().is_none());
        assert_eq!(store.list_menu_items(Some(restaurant.id)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_menu_item_scoped_to_restaurant() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);
        let a = catalog.create_restaurant(restaurant_input()).await.unwrap();
        let b = catalog.create_restaurant(restaurant_input()).await.unwrap();
        let item = catalog.create_menu_item(a.id, item_input("A")).await.unwrap();

        assert!(matches!(
            catalog.delete_menu_item(b.id, item.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(catalog.delete_menu_item(a.id, item.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_create_menu_item_for_unknown_restaurant() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);

        assert!(matches!(
            catalog.create_menu_item(RestaurantId::new(99), item_input("A")).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_menu_prices_must_be_whole_cents() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);
        let restaurant = catalog.create_restaurant(restaurant_input()).await.unwrap();

        let mut sub_cent = item_input("A");
        sub_cent.price = Some(Price::new("0.125".parse().unwrap()));
        assert!(matches!(
            catalog.create_menu_item(restaurant.id, sub_cent).await,
            Err(AppError::BadRequest(_))
        ));

        let item = catalog.create_menu_item(restaurant.id, item_input("B")).await.unwrap();
        let patch = MenuItemInput {
            price: Some(Price::new("10000000000".parse().unwrap())),
            ..MenuItemInput::default()
        };
        assert!(matches!(
            catalog.update_menu_item(restaurant.id, item.id, patch).await,
            Err(AppError::BadRequest(_))
        ));
        assert_eq!(
            store.list_menu_items(None).await.unwrap().first().unwrap().price,
            Price::from_minor_units(950)
        );
    }

    #[tokio::test]
    async fn test_rate_four_then_two() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);
        let restaurant = catalog.create_restaurant(restaurant_input()).await.unwrap();
        let item = catalog.create_menu_item(restaurant.id, item_input("A")).await.unwrap();
        let user = UserId::new(1);

        catalog.rate(item.id, user, Some(4)).await.unwrap();
        let rated = catalog.rate(item.id, user, Some(2)).await.unwrap();

        assert_eq!(rated.ratings.len(), 1);
        assert!((rated.average_rating - 2.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_rate_validates_range() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);

        for bad in [None, Some(0), Some(6)] {
            assert!(matches!(
                catalog.rate(MenuItemId::new(1), UserId::new(1), bad).await,
                Err(AppError::BadRequest(_))
            ));
        }
        assert!(matches!(
            catalog.rate(MenuItemId::new(1), UserId::new(1), Some(3)).await,
            Err(AppError::NotFound(_))
        ));
    }
}
