//! Startup hydration: read every table into a fresh [`Store`].

use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::persistence::{accounts, catalog, orders, reviews};
use crate::store::Store;
use crate::types::order::OrderItem;

pub async fn load_store(pool: &PgPool) -> Result<Store, sqlx::Error> {
    let mut store = Store::default();

    for c in catalog::list_categories(pool).await? {
        store.categories.insert(c.id, c);
    }
    for p in catalog::list_products(pool).await? {
        store.products.insert(p.id, p);
    }
    store.put_inventory(catalog::list_inventory(pool).await?);
    for a in accounts::list_admins(pool).await? {
        store.admins.insert(a.id, a);
    }
    for c in accounts::list_customers(pool).await? {
        store.customers.insert(c.id, c);
    }

    let mut items: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for row in orders::list_order_items(pool).await? {
        if let Some(item) = orders::item_row_to_item(&row) {
            items.entry(item.order_id).or_default().push(item);
        }
    }
    let mut skipped = 0usize;
    for row in orders::list_orders(pool).await? {
        let order_items = items.remove(&row.id).unwrap_or_default();
        match orders::order_row_to_order(row, order_items) {
            Some(order) => {
                store.orders.insert(order.id, order);
            }
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        tracing::warn!(skipped, "orders with unknown status were not loaded");
    }

    for r in reviews::list_reviews(pool).await? {
        store.reviews.insert(r.id, r);
    }

    tracing::info!(
        categories = store.categories.len(),
        products = store.products.len(),
        customers = store.customers.len(),
        orders = store.orders.len(),
        reviews = store.reviews.len(),
        "store hydrated"
    );
    Ok(store)
}
