//! Database layer: pool, migrations, write-through for every table and
//! hydration of the in-memory [`Store`](crate::store::Store).

mod accounts;
mod catalog;
mod hydrate;
mod orders;
mod pool;
mod reviews;

pub use accounts::{insert_admin, insert_customer};
pub use catalog::{
    delete_category, delete_product, upsert_category, upsert_inventory, upsert_product,
};
pub use hydrate::load_store;
pub use orders::{insert_order, update_order_status};
pub use pool::{create_pool_and_migrate, ping, run_migrations};
pub use reviews::{delete_review, upsert_review};
pub use sqlx::PgPool;

use crate::types::order::Qty;

/// Quantities are INTEGER columns; refuse to bind what would wrap.
fn db_qty(quantity: Qty) -> Result<i32, sqlx::Error> {
    i32::try_from(quantity).map_err(|e| sqlx::Error::Encode(Box::new(e)))
}
