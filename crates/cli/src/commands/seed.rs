//! Seed the catalog from a YAML file.
//!
//! ```yaml
//! restaurants:
//!   - name: Noodle Bar
//!     cuisine: Thai
//!     image: https://cdn.example.com/noodle-bar.jpg
//!     location: 12 Main St
//!     isLateNight: true
//!     menu:
//!       - name: Pad Thai
//!         description: Rice noodles, tamarind, peanuts
//!         price: 12.5
//!         image: https://cdn.example.com/pad-thai.jpg
//! ```
//!
//! The whole file is parsed and validated before anything is written.
//! Seeding is not idempotent: running it twice inserts everything twice.

use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use platter_api::db::{self, CatalogStore, PgStore};
use platter_api::models::{NewMenuItem, NewRestaurant};
use platter_core::Price;

use super::{DATABASE_URL_VAR, database_url};

/// Top level of a catalog seed file.
#[derive(Debug, Deserialize)]
pub struct CatalogSeed {
    pub restaurants: Vec<RestaurantSeed>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantSeed {
    pub name: String,
    pub cuisine: String,
    pub image: String,
    pub location: String,
    #[serde(default)]
    pub is_late_night: bool,
    #[serde(default)]
    pub menu: Vec<MenuItemSeed>,
}

#[derive(Debug, Deserialize)]
pub struct MenuItemSeed {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub image: String,
}

/// Check a parsed seed file, returning one message per problem.
#[must_use]
pub fn validate_seed(seed: &CatalogSeed) -> Vec<String> {
    let mut errors = Vec::new();

    if seed.restaurants.is_empty() {
        errors.push("no restaurants defined".to_owned());
    }

    for (i, restaurant) in seed.restaurants.iter().enumerate() {
        let label = format!("restaurants[{i}] ({})", restaurant.name);
        for (field, value) in [
            ("name", &restaurant.name),
            ("cuisine", &restaurant.cuisine),
            ("image", &restaurant.image),
            ("location", &restaurant.location),
        ] {
            if value.trim().is_empty() {
                errors.push(format!("{label}: {field} is empty"));
            }
        }

        for (j, item) in restaurant.menu.iter().enumerate() {
            let label = format!("{label} menu[{j}] ({})", item.name);
            for (field, value) in [
                ("name", &item.name),
                ("description", &item.description),
                ("image", &item.image),
            ] {
                if value.trim().is_empty() {
                    errors.push(format!("{label}: {field} is empty"));
                }
            }
            if item.price < Price::ZERO {
                errors.push(format!("{label}: price is negative"));
            }
            if let Err(e) = item.price.ensure_storable() {
                errors.push(format!("{label}: {e}"));
            }
        }
    }

    errors
}

/// Seed restaurants and menus from a YAML file.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the file cannot be read
/// or fails validation, or a database operation fails.
pub async fn catalog(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let database_url = database_url().ok_or(format!("{DATABASE_URL_VAR} not set"))?;

    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let seed: CatalogSeed = serde_yaml::from_str(&content)?;

    let errors = validate_seed(&seed);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let store = PgStore::new(db::create_pool(&database_url).await?);
    info!("Connected to database");

    let mut menu_items = 0_usize;
    for restaurant in seed.restaurants {
        let created = store
            .create_restaurant(NewRestaurant {
                name: restaurant.name,
                cuisine: restaurant.cuisine,
                image: restaurant.image,
                is_late_night: restaurant.is_late_night,
                location: restaurant.location,
            })
            .await?;

        for item in restaurant.menu {
            store
                .create_menu_item(NewMenuItem {
                    restaurant_id: created.id,
                    name: item.name,
                    description: item.description,
                    price: item.price,
                    image: item.image,
                })
                .await?;
            menu_items += 1;
        }

        info!(restaurant_id = %created.id, name = %created.name, "Seeded restaurant");
    }

    info!(menu_items, "Seeding complete!");
    Ok(())
}
