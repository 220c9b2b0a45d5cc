//! In-memory store for tests.
//!
//! Mirrors the Postgres schema closely enough for the API's behavior to be
//! exercised without a database: serial ids per table, unique emails, one
//! cart row per (user, menu item), cart rows cascading with their menu
//! item, and order lines that outlive the catalog.
//!
//! [`FailPoint`]s make a single operation fail so tests can observe the
//! partial state left by multi-step sequences.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use platter_core::{
    CartItemId, Email, MenuItemId, OrderId, OrderStatus, Quantity, Rating, RestaurantId, UserId,
};

use super::{CartStore, CatalogStore, OrderStore, RepositoryError, Store, UserStore};
use crate::models::{
    Buyer, CartEntry, CartItem, MenuItem, MenuItemPatch, NewMenuItem, NewOrder, NewRestaurant,
    NewUser, Order, OrderDetail, OrderLineDetail, OrderOwner, Restaurant, RestaurantPatch, User,
};

/// A store operation that can be made to fail on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    /// [`CartStore::clear_cart`].
    ClearCart,
    /// [`CatalogStore::delete_menu_items_for`].
    DeleteMenuItems,
    /// [`OrderStore::create_order`].
    CreateOrder,
    /// [`UserStore::user_by_id`].
    LoadUser,
}

#[derive(Debug, Default)]
struct Sequences {
    user: i32,
    restaurant: i32,
    menu_item: i32,
    cart_item: i32,
    order: i32,
}

fn next(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

#[derive(Debug, Default)]
struct Tables {
    seq: Sequences,
    users: BTreeMap<UserId, User>,
    restaurants: BTreeMap<RestaurantId, Restaurant>,
    menu_items: BTreeMap<MenuItemId, MenuItem>,
    cart_items: BTreeMap<CartItemId, CartItem>,
    orders: BTreeMap<OrderId, Order>,
    failures: HashSet<FailPoint>,
}

impl Tables {
    fn check(&self, point: FailPoint) -> Result<(), RepositoryError> {
        if self.failures.contains(&point) {
            return Err(RepositoryError::Unavailable(format!(
                "injected failure at {point:?}"
            )));
        }
        Ok(())
    }

    fn line_details(&self, order: &Order) -> Vec<OrderLineDetail> {
        order
            .items
            .iter()
            .map(|line| OrderLineDetail {
                menu_item_id: line.menu_item_id,
                menu_item: self.menu_items.get(&line.menu_item_id).map(MenuItem::summary),
                quantity: line.quantity,
                price: line.price,
            })
            .collect()
    }

    fn detail(&self, order: &Order, user: OrderOwner) -> OrderDetail {
        OrderDetail {
            id: order.id,
            user,
            items: self.line_details(order),
            total: order.total,
            address: order.address.clone(),
            status: order.status.clone(),
            created_at: order.created_at,
        }
    }

    /// Orders matching `filter`, newest first.
    fn orders_newest_first(&self, filter: impl Fn(&Order) -> bool) -> Vec<&Order> {
        let mut orders: Vec<&Order> = self.orders.values().filter(|o| filter(o)).collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        orders
    }
}

/// Thread-safe in-memory implementation of every store trait.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `point` fail until [`MemoryStore::heal`] is called.
    pub fn fail_on(&self, point: FailPoint) {
        if let Ok(mut tables) = self.tables.lock() {
            tables.failures.insert(point);
        }
    }

    /// Stop failing at `point`.
    pub fn heal(&self, point: FailPoint) {
        if let Ok(mut tables) = self.tables.lock() {
            tables.failures.remove(&point);
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("memory store lock poisoned".to_owned()))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let tables = self.lock()?;
        tables.check(FailPoint::LoadUser)?;
        Ok(tables.users.get(&id).cloned())
    }

    async fn user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let tables = self.lock()?;
        Ok(tables.users.values().find(|u| &u.email == email).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut tables = self.lock()?;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let id = UserId::new(next(&mut tables.seq.user));
        let created = User {
            id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            address: user.address,
            phone: user.phone,
            profile_picture: user.profile_picture,
            is_admin: user.is_admin,
            created_at: Utc::now(),
        };
        tables.users.insert(id, created.clone());
        Ok(created)
    }

    async fn set_admin(&self, email: &Email, is_admin: bool) -> Result<User, RepositoryError> {
        let mut tables = self.lock()?;
        let user = tables
            .users
            .values_mut()
            .find(|u| &u.email == email)
            .ok_or(RepositoryError::NotFound)?;
        user.is_admin = is_admin;
        Ok(user.clone())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_restaurants(&self) -> Result<Vec<Restaurant>, RepositoryError> {
        Ok(self.lock()?.restaurants.values().cloned().collect())
    }

    async fn restaurant(&self, id: RestaurantId) -> Result<Option<Restaurant>, RepositoryError> {
        Ok(self.lock()?.restaurants.get(&id).cloned())
    }

    async fn create_restaurant(&self, new: NewRestaurant) -> Result<Restaurant, RepositoryError> {
        let mut tables = self.lock()?;
        let id = RestaurantId::new(next(&mut tables.seq.restaurant));
        let restaurant = Restaurant {
            id,
            name: new.name,
            cuisine: new.cuisine,
            image: new.image,
            is_late_night: new.is_late_night,
            location: new.location,
        };
        tables.restaurants.insert(id, restaurant.clone());
        Ok(restaurant)
    }

    async fn update_restaurant(
        &self,
        id: RestaurantId,
        patch: RestaurantPatch,
    ) -> Result<Option<Restaurant>, RepositoryError> {
        let mut tables = self.lock()?;
        Ok(tables.restaurants.get_mut(&id).map(|restaurant| {
            patch.apply(restaurant);
            restaurant.clone()
        }))
    }

    async fn delete_restaurant(&self, id: RestaurantId) -> Result<bool, RepositoryError> {
        Ok(self.lock()?.restaurants.remove(&id).is_some())
    }

    async fn delete_menu_items_for(
        &self,
        restaurant: RestaurantId,
    ) -> Result<u64, RepositoryError> {
        let mut tables = self.lock()?;
        tables.check(FailPoint::DeleteMenuItems)?;

        let doomed: Vec<MenuItemId> = tables
            .menu_items
            .values()
            .filter(|item| item.restaurant_id == restaurant)
            .map(|item| item.id)
            .collect();
        for id in &doomed {
            tables.menu_items.remove(id);
        }
        tables
            .cart_items
            .retain(|_, row| !doomed.contains(&row.menu_item_id));

        Ok(u64::try_from(doomed.len()).unwrap_or(u64::MAX))
    }

    async fn list_menu_items(
        &self,
        restaurant: Option<RestaurantId>,
    ) -> Result<Vec<MenuItem>, RepositoryError> {
        Ok(self
            .lock()?
            .menu_items
            .values()
            .filter(|item| restaurant.is_none_or(|r| item.restaurant_id == r))
            .cloned()
            .collect())
    }

    async fn menu_item(&self, id: MenuItemId) -> Result<Option<MenuItem>, RepositoryError> {
        Ok(self.lock()?.menu_items.get(&id).cloned())
    }

    async fn create_menu_item(&self, new: NewMenuItem) -> Result<MenuItem, RepositoryError> {
        let mut tables = self.lock()?;
        let id = MenuItemId::new(next(&mut tables.seq.menu_item));
        let item = MenuItem {
            id,
            restaurant_id: new.restaurant_id,
            name: new.name,
            description: new.description,
            price: new.price,
            image: new.image,
            ratings: Vec::new(),
            average_rating: 0.0,
        };
        tables.menu_items.insert(id, item.clone());
        Ok(item)
    }

    async fn update_menu_item(
        &self,
        restaurant: RestaurantId,
        id: MenuItemId,
        patch: MenuItemPatch,
    ) -> Result<Option<MenuItem>, RepositoryError> {
        let mut tables = self.lock()?;
        Ok(tables
            .menu_items
            .get_mut(&id)
            .filter(|item| item.restaurant_id == restaurant)
            .map(|item| {
                patch.apply(item);
                item.clone()
            }))
    }

    async fn delete_menu_item(
        &self,
        restaurant: RestaurantId,
        id: MenuItemId,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.lock()?;
        let owned = tables
            .menu_items
            .get(&id)
            .is_some_and(|item| item.restaurant_id == restaurant);
        if !owned {
            return Ok(false);
        }
        tables.menu_items.remove(&id);
        tables.cart_items.retain(|_, row| row.menu_item_id != id);
        Ok(true)
    }

    async fn rate_menu_item(
        &self,
        id: MenuItemId,
        user: UserId,
        rating: Rating,
    ) -> Result<Option<MenuItem>, RepositoryError> {
        let mut tables = self.lock()?;
        Ok(tables.menu_items.get_mut(&id).map(|item| {
            item.apply_rating(user, rating);
            item.clone()
        }))
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn cart_entries(&self, user: UserId) -> Result<Vec<CartEntry>, RepositoryError> {
        let tables = self.lock()?;
        Ok(tables
            .cart_items
            .values()
            .filter(|row| row.user_id == user)
            .filter_map(|row| {
                let item = tables.menu_items.get(&row.menu_item_id)?;
                Some(CartEntry {
                    id: row.id,
                    user_id: row.user_id,
                    menu_item: item.summary(),
                    quantity: row.quantity,
                })
            })
            .collect())
    }

    async fn add_to_cart(
        &self,
        user: UserId,
        item: MenuItemId,
        quantity: Quantity,
    ) -> Result<CartItem, RepositoryError> {
        let mut tables = self.lock()?;
        if !tables.menu_items.contains_key(&item) {
            return Err(RepositoryError::NotFound);
        }

        if let Some(row) = tables
            .cart_items
            .values_mut()
            .find(|row| row.user_id == user && row.menu_item_id == item)
        {
            row.quantity = row.quantity.saturating_add(quantity);
            return Ok(row.clone());
        }

        let id = CartItemId::new(next(&mut tables.seq.cart_item));
        let row = CartItem {
            id,
            user_id: user,
            menu_item_id: item,
            quantity,
        };
        tables.cart_items.insert(id, row.clone());
        Ok(row)
    }

    async fn update_cart_item(
        &self,
        user: UserId,
        id: CartItemId,
        quantity: Quantity,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let mut tables = self.lock()?;
        Ok(tables
            .cart_items
            .get_mut(&id)
            .filter(|row| row.user_id == user)
            .map(|row| {
                row.quantity = quantity;
                row.clone()
            }))
    }

    async fn remove_cart_item(
        &self,
        user: UserId,
        id: CartItemId,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.lock()?;
        let owned = tables.cart_items.get(&id).is_some_and(|row| row.user_id == user);
        if owned {
            tables.cart_items.remove(&id);
        }
        Ok(owned)
    }

    async fn clear_cart(&self, user: UserId) -> Result<u64, RepositoryError> {
        let mut tables = self.lock()?;
        tables.check(FailPoint::ClearCart)?;

        let before = tables.cart_items.len();
        tables.cart_items.retain(|_, row| row.user_id != user);
        Ok(u64::try_from(before - tables.cart_items.len()).unwrap_or(u64::MAX))
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn create_order(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        let mut tables = self.lock()?;
        tables.check(FailPoint::CreateOrder)?;

        let id = OrderId::new(next(&mut tables.seq.order));
        let order = order.into_order(id, Utc::now());
        tables.orders.insert(id, order.clone());
        Ok(order)
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.lock()?.orders.get(&id).cloned())
    }

    async fn orders_for_user(&self, user: UserId) -> Result<Vec<OrderDetail>, RepositoryError> {
        let tables = self.lock()?;
        Ok(tables
            .orders_newest_first(|o| o.user_id == user)
            .into_iter()
            .map(|o| tables.detail(o, OrderOwner::Id(o.user_id)))
            .collect())
    }

    async fn order_detail_for_user(
        &self,
        user: UserId,
        id: OrderId,
    ) -> Result<Option<OrderDetail>, RepositoryError> {
        let tables = self.lock()?;
        Ok(tables
            .orders
            .get(&id)
            .filter(|o| o.user_id == user)
            .map(|o| tables.detail(o, OrderOwner::Id(o.user_id))))
    }

    async fn all_orders(&self) -> Result<Vec<OrderDetail>, RepositoryError> {
        let tables = self.lock()?;
        tables
            .orders_newest_first(|_| true)
            .into_iter()
            .map(|o| {
                let buyer = tables.users.get(&o.user_id).ok_or_else(|| {
                    RepositoryError::DataCorruption(format!("order {} has no user", o.id))
                })?;
                let owner = OrderOwner::Buyer(Buyer {
                    id: buyer.id,
                    name: buyer.name.clone(),
                    email: buyer.email.clone(),
                });
                Ok(tables.detail(o, owner))
            })
            .collect()
    }

    async fn set_order_status(
        &self,
        id: OrderId,
        status: &OrderStatus,
    ) -> Result<Option<Order>, RepositoryError> {
        let mut tables = self.lock()?;
        Ok(tables.orders.get_mut(&id).map(|order| {
            order.status = status.clone();
            order.clone()
        }))
    }

    async fn transition_order_status(
        &self,
        id: OrderId,
        from: &OrderStatus,
        to: &OrderStatus,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.lock()?;
        match tables.orders.get_mut(&id) {
            Some(order) if &order.status == from => {
                order.status = to.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_order(&self, id: OrderId) -> Result<bool, RepositoryError> {
        Ok(self.lock()?.orders.remove(&id).is_some())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        self.lock().map(|_| ())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use platter_core::Price;

    use super::*;
    use crate::models::OrderLine;

    async fn seed_item(store: &MemoryStore, restaurant: RestaurantId, cents: i64) -> MenuItem {
        store
            .create_menu_item(NewMenuItem {
                restaurant_id: restaurant,
                name: "Dumplings".to_owned(),
                description: "Pork and chive".to_owned(),
                price: Price::from_minor_units(cents),
                image: "dumplings.jpg".to_owned(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_add_to_cart_merges_rows() {
        let store = MemoryStore::new();
        let item = seed_item(&store, RestaurantId::new(1), 500).await;
        let user = UserId::new(1);

        store.add_to_cart(user, item.id, Quantity::new(2).unwrap()).await.unwrap();
        let row = store.add_to_cart(user, item.id, Quantity::new(3).unwrap()).await.unwrap();

        assert_eq!(row.quantity.get(), 5);
        assert_eq!(store.cart_entries(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_deleting_menu_item_drops_cart_rows_but_not_order_lines() {
        let store = MemoryStore::new();
        let restaurant = RestaurantId::new(1);
        let item = seed_item(&store, restaurant, 500).await;
        let user = UserId::new(1);

        store.add_to_cart(user, item.id, Quantity::ONE).await.unwrap();
        let new_order = NewOrder::new(
            user,
            vec![OrderLine {
                menu_item_id: item.id,
                quantity: Quantity::ONE,
                price: item.price,
            }],
            None,
        )
        .unwrap();
        let order = store.create_order(new_order).await.unwrap();

        assert!(store.delete_menu_item(restaurant, item.id).await.unwrap());

        assert!(store.cart_entries(user).await.unwrap().is_empty());
        let detail = store.order_detail_for_user(user, order.id).await.unwrap().unwrap();
        assert_eq!(detail.items.len(), 1);
        assert!(detail.items.first().unwrap().menu_item.is_none());
    }

    #[tokio::test]
    async fn test_fail_point_only_affects_its_operation() {
        let store = MemoryStore::new();
        store.fail_on(FailPoint::ClearCart);

        assert!(store.clear_cart(UserId::new(1)).await.is_err());
        assert!(store.list_restaurants().await.is_ok());

        store.heal(FailPoint::ClearCart);
        assert_eq!(store.clear_cart(UserId::new(1)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_transition_requires_expected_status() {
        let store = MemoryStore::new();
        let order = store
            .create_order(NewOrder::new(UserId::new(1), Vec::new(), None).unwrap())
            .await
            .unwrap();

        let preparing = OrderStatus::parse("Preparing").unwrap();
        assert!(
            !store
                .transition_order_status(order.id, &preparing, &OrderStatus::cancelled())
                .await
                .unwrap()
        );
        assert!(
            store
                .transition_order_status(
                    order.id,
                    &OrderStatus::pending(),
                    &OrderStatus::cancelled()
                )
                .await
                .unwrap()
        );
        assert_eq!(
            store.order(order.id).await.unwrap().unwrap().status,
            OrderStatus::cancelled()
        );
    }
}
