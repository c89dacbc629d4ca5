//! The `OnlineStoreUser` profile: a shopper that browses product pages and
//! updates product details.
//!
//! After each task the user sleeps between one and three seconds. Both tasks
//! have the same weight, so each runs about half the time unless tags filter
//! one of them out.
//!
//! ```rust,no_run
//! use storefront_swarm::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), SwarmError> {
//!     SwarmAttack::initialize()?
//!         .register_profile(storefront::online_store_user()?)
//!         .set_default(SwarmDefault::Host, "http://localhost:8080")?
//!         .execute()
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::swarm::{Profile, SwarmUser, TaskResult};
use crate::{task, SwarmError};

/// The name the profile is registered and reported under.
pub const PROFILE_NAME: &str = "OnlineStoreUser";
/// Tag on the task that browses products.
pub const VIEW_TAG: &str = "view";
/// Tag on the task that updates a product.
pub const UPDATE_TAG: &str = "update";
/// The first product browsed.
pub const FIRST_PRODUCT: i64 = 1;
/// The last product browsed.
pub const LAST_PRODUCT: i64 = 10;
/// Where product updates are posted.
pub const UPDATE_PATH: &str = "/products/1/details";
/// Shortest pause between tasks.
pub const MIN_WAIT: Duration = Duration::from_secs(1);
/// Longest pause between tasks.
pub const MAX_WAIT: Duration = Duration::from_secs(3);

/// A product record as the store's API serializes it.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Product {
    pub product_id: i64,
    pub sku: String,
    pub manufacturer: String,
    pub category_id: i64,
    pub weight: i64,
    pub some_other_id: i64,
}
impl Product {
    /// The fixed payload posted by [`update_product`].
    pub fn updated() -> Self {
        Product {
            product_id: 1,
            sku: "updated_sku".to_string(),
            manufacturer: "updated_manufacturer".to_string(),
            category_id: 1,
            weight: 150,
            some_other_id: 11,
        }
    }
}

/// The path of a single product page.
pub fn product_path(product_id: i64) -> String {
    format!("/products/{}", product_id)
}

/// Build the `OnlineStoreUser` profile.
pub fn online_store_user() -> Result<Profile, SwarmError> {
    Ok(Profile::new(PROFILE_NAME)
        .set_wait_time(MIN_WAIT, MAX_WAIT)?
        .register_task(
            task!(browse_products)
                .set_name("browse_products")
                .set_tag(VIEW_TAG)
                .set_weight(1)?,
        )
        .register_task(
            task!(update_product)
                .set_name("update_product")
                .set_tag(UPDATE_TAG)
                .set_weight(1)?,
        ))
}

/// Load products 1 through 10, one after another.
///
/// Failed requests are recorded in the metrics and browsing continues.
pub async fn browse_products(user: &mut SwarmUser) -> TaskResult {
    for product_id in FIRST_PRODUCT..=LAST_PRODUCT {
        let _swarm = user.get(&product_path(product_id)).await?;
    }

    Ok(())
}

/// Post new details for product 1. The response is not inspected.
pub async fn update_product(user: &mut SwarmUser) -> TaskResult {
    let _swarm = user.post_json(UPDATE_PATH, &Product::updated()).await?;

    Ok(())
}
