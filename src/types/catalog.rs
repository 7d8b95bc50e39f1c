use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::order::{Amount, Qty};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Amount,
    pub brand: Option<String>,
    pub material: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub image_urls: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stock for one product. `reserved_quantity` never exceeds `quantity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: Qty,
    pub reserved_quantity: Qty,
    pub location: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Inventory {
    pub fn new(product_id: Uuid, quantity: Qty, location: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id,
            quantity,
            reserved_quantity: 0,
            location,
            updated_at: Utc::now(),
        }
    }

    /// Available-to-sell.
    pub fn available(&self) -> Qty {
        self.quantity.saturating_sub(self.reserved_quantity)
    }
}
