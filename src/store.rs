//! In-process tables. Hydrated from Postgres at startup when a database is
//! configured, otherwise the only copy.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::types::account::{Admin, Customer};
use crate::types::catalog::{Category, Inventory, Product};
use crate::types::order::Order;
use crate::types::review::Review;

pub type SharedStore = Arc<RwLock<Store>>;

#[derive(Debug, Default)]
pub struct Store {
    pub categories: HashMap<Uuid, Category>,
    pub products: HashMap<Uuid, Product>,
    /// Keyed by product id; one record per product.
    pub inventory: HashMap<Uuid, Inventory>,
    pub customers: HashMap<Uuid, Customer>,
    pub admins: HashMap<Uuid, Admin>,
    pub orders: HashMap<Uuid, Order>,
    pub reviews: HashMap<Uuid, Review>,
}

impl Store {
    pub fn shared(self) -> SharedStore {
        Arc::new(RwLock::new(self))
    }

    /// Emails are compared case-insensitively.
    pub fn customer_by_email(&self, email: &str) -> Option<&Customer> {
        self.customers
            .values()
            .find(|c| c.email.eq_ignore_ascii_case(email))
    }

    pub fn admin_by_email(&self, email: &str) -> Option<&Admin> {
        self.admins
            .values()
            .find(|a| a.email.eq_ignore_ascii_case(email))
    }

    pub fn category_by_name(&self, name: &str) -> Option<&Category> {
        let needle = name.trim().to_lowercase();
        self.categories
            .values()
            .find(|c| c.name.to_lowercase() == needle)
    }

    pub fn products_in_category(&self, category_id: Uuid) -> usize {
        self.products
            .values()
            .filter(|p| p.category_id == category_id)
            .count()
    }

    /// Orders of one customer, newest first.
    pub fn orders_of(&self, customer_id: Uuid) -> Vec<&Order> {
        let mut orders: Vec<&Order> = self
            .orders
            .values()
            .filter(|o| o.customer_id == customer_id)
            .collect();
        orders.sort_by(|a, b| b.order_date.cmp(&a.order_date));
        orders
    }

    pub fn put_inventory(&mut self, records: Vec<Inventory>) {
        for inv in records {
            self.inventory.insert(inv.product_id, inv);
        }
    }
}
