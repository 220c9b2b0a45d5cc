//! Restaurants, menu items and ratings.

use serde::Serialize;

use platter_core::{MenuItemId, Price, Rating, RestaurantId, UserId, average_rating};

/// A restaurant in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: RestaurantId,
    pub name: String,
    pub cuisine: String,
    pub image: String,
    pub is_late_night: bool,
    pub location: String,
}

/// Data required to create a restaurant.
#[derive(Debug, Clone)]
pub struct NewRestaurant {
    pub name: String,
    pub cuisine: String,
    pub image: String,
    pub is_late_night: bool,
    pub location: String,
}

/// Partial restaurant update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct RestaurantPatch {
    pub name: Option<String>,
    pub cuisine: Option<String>,
    pub image: Option<String>,
    pub is_late_night: Option<bool>,
    pub location: Option<String>,
}

impl RestaurantPatch {
    /// Apply the patch in place.
    pub fn apply(self, restaurant: &mut Restaurant) {
        if let Some(name) = self.name {
            restaurant.name = name;
        }
        if let Some(cuisine) = self.cuisine {
            restaurant.cuisine = cuisine;
        }
        if let Some(image) = self.image {
            restaurant.image = image;
        }
        if let Some(is_late_night) = self.is_late_night {
            restaurant.is_late_night = is_late_night;
        }
        if let Some(location) = self.location {
            restaurant.location = location;
        }
    }
}

/// One user's rating of a menu item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MenuItemRating {
    pub user: UserId,
    pub rating: Rating,
}

/// A dish offered by a restaurant, with its ratings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: MenuItemId,
    #[serde(rename = "restaurant")]
    pub restaurant_id: RestaurantId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub image: String,
    /// Ratings in submission order, at most one per user.
    pub ratings: Vec<MenuItemRating>,
    /// Mean of `ratings`, `0.0` when unrated.
    pub average_rating: f64,
}

impl MenuItem {
    /// Record `user`'s rating, replacing any earlier one, and recompute the
    /// average.
    ///
    /// The replaced rating is dropped from its old position and the new one
    /// goes to the end.
    pub fn apply_rating(&mut self, user: UserId, rating: Rating) {
        self.ratings.retain(|r| r.user != user);
        self.ratings.push(MenuItemRating { user, rating });
        self.average_rating = average_rating(self.ratings.iter().map(|r| r.rating));
    }

    /// The rating-free view used in cart and order joins.
    #[must_use]
    pub fn summary(&self) -> MenuItemSummary {
        MenuItemSummary {
            id: self.id,
            restaurant_id: self.restaurant_id,
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price,
            image: self.image.clone(),
            average_rating: self.average_rating,
        }
    }
}

/// Menu item details joined into cart rows and order lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemSummary {
    pub id: MenuItemId,
    #[serde(rename = "restaurant")]
    pub restaurant_id: RestaurantId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub image: String,
    pub average_rating: f64,
}

/// Data required to create a menu item.
#[derive(Debug, Clone)]
pub struct NewMenuItem {
    pub restaurant_id: RestaurantId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub image: String,
}

/// Partial menu item update. Ratings are only changed through rating.
#[derive(Debug, Clone, Default)]
pub struct MenuItemPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub image: Option<String>,
}

impl MenuItemPatch {
    /// Apply the patch in place.
    pub fn apply(self, item: &mut MenuItem) {
        if let Some(name) = self.name {
            item.name = name;
        }
        if let Some(description) = self.description {
            item.description = description;
        }
        if let Some(price) = self.price {
            item.price = price;
        }
        if let Some(image) = self.image {
            item.image = image;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item() -> MenuItem {
        MenuItem {
            id: MenuItemId::new(1),
            restaurant_id: RestaurantId::new(1),
            name: "Pad Thai".to_owned(),
            description: "Rice noodles".to_owned(),
            price: Price::from_minor_units(1200),
            image: "pad-thai.jpg".to_owned(),
            ratings: Vec::new(),
            average_rating: 0.0,
        }
    }

    fn rating(v: i64) -> Rating {
        Rating::try_from(v).unwrap()
    }

    #[test]
    fn test_rerating_replaces_previous_rating() {
        let mut item = item();
        let user = UserId::new(3);

        item.apply_rating(user, rating(4));
        assert!((item.average_rating - 4.0).abs() < f64::EPSILON);

        item.apply_rating(user, rating(2));
        assert_eq!(item.ratings.len(), 1);
        assert!((item.average_rating - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rerating_moves_rating_to_the_end() {
        let mut item = item();
        item.apply_rating(UserId::new(1), rating(5));
        item.apply_rating(UserId::new(2), rating(3));
        item.apply_rating(UserId::new(1), rating(1));

        let users: Vec<_> = item.ratings.iter().map(|r| r.user).collect();
        assert_eq!(users, vec![UserId::new(2), UserId::new(1)]);
        assert_eq!(item.ratings.last().unwrap().rating, rating(1));
    }

    #[test]
    fn test_average_tracks_all_users() {
        let mut item = item();
        item.apply_rating(UserId::new(1), rating(5));
        item.apply_rating(UserId::new(2), rating(3));
        item.apply_rating(UserId::new(1), rating(1));

        assert_eq!(item.ratings.len(), 2);
        assert_eq!(item.ratings.last().map(|r| r.user), Some(UserId::new(1)));
        assert!((item.average_rating - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_restaurant_patch_only_touches_given_fields() {
        let mut restaurant = Restaurant {
            id: RestaurantId::new(1),
            name: "Noodle Bar".to_owned(),
            cuisine: "Thai".to_owned(),
            image: "bar.jpg".to_owned(),
            is_late_night: false,
            location: "Main St".to_owned(),
        };

        RestaurantPatch {
            is_late_night: Some(true),
            ..Default::default()
        }
        .apply(&mut restaurant);

        assert!(restaurant.is_late_night);
        assert_eq!(restaurant.name, "Noodle Bar");
    }

    #[test]
    fn test_menu_item_serializes_camel_case() {
        let json = serde_json::to_value(item()).unwrap();
        assert_eq!(json["averageRating"], 0.0);
        assert_eq!(json["restaurant"], 1);
        assert_eq!(json["price"], 12.0);
    }
}
