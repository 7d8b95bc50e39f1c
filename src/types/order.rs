use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whole VND; the store never deals in fractional amounts.
pub type Amount = i64;
pub type Qty = u32;
/// Largest quantity a stock record or order line may hold (an INTEGER column).
pub const MAX_QTY: Qty = i32::MAX as Qty;
pub type OrderId = Uuid;

/// Canonical order status as stored in the order record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Completed,
    Cancelled,
    Refunded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: OrderId,
    pub product_id: Uuid,
    pub quantity: Qty,
    pub unit_price: Amount,
    pub total_price: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: Uuid,
    pub status: OrderStatus,
    pub total_amount: Amount,
    pub shipping_address: String,
    pub billing_address: Option<String>,
    pub order_date: DateTime<Utc>,
    pub shipped_date: Option<DateTime<Utc>>,
    pub delivered_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Quantity ordered per product, summed across lines. `None` when a sum
    /// does not fit in [`Qty`].
    pub fn quantities_by_product(&self) -> Option<Vec<(Uuid, Qty)>> {
        let mut totals: Vec<(Uuid, Qty)> = Vec::new();
        for item in &self.items {
            match totals.iter_mut().find(|(pid, _)| *pid == item.product_id) {
                Some((_, qty)) => *qty = qty.checked_add(item.quantity)?,
                None => totals.push((item.product_id, item.quantity)),
            }
        }
        Some(totals)
    }

    pub fn contains_product(&self, product_id: Uuid) -> bool {
        self.items.iter().any(|i| i.product_id == product_id)
    }
}

impl OrderStatus {
    /// Canonical code, as stored.
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }

    pub fn from_code(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "processing" => Some(OrderStatus::Processing),
            "shipped" => Some(OrderStatus::Shipped),
            "delivered" => Some(OrderStatus::Delivered),
            "completed" => Some(OrderStatus::Completed),
            "cancelled" => Some(OrderStatus::Cancelled),
            "refunded" => Some(OrderStatus::Refunded),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_with(lines: &[(Uuid, Qty)]) -> Order {
        let now = Utc::now();
        let id = Uuid::new_v4();
        Order {
            id,
            customer_id: Uuid::new_v4(),
            status: OrderStatus::Pending,
            total_amount: 0,
            shipping_address: "Hà Nội".into(),
            billing_address: None,
            order_date: now,
            shipped_date: None,
            delivered_date: None,
            created_at: now,
            updated_at: now,
            items: lines
                .iter()
                .map(|&(product_id, quantity)| OrderItem {
                    id: Uuid::new_v4(),
                    order_id: id,
                    product_id,
                    quantity,
                    unit_price: 1,
                    total_price: Amount::from(quantity),
                })
                .collect(),
        }
    }

    #[test]
    fn quantities_are_summed_per_product() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let order = order_with(&[(a, 2), (b, 1), (a, 3)]);
        assert_eq!(order.quantities_by_product(), Some(vec![(a, 5), (b, 1)]));
    }

    #[test]
    fn overflowing_sum_is_none() {
        let a = Uuid::new_v4();
        let order = order_with(&[(a, 1 << 31), (a, 1 << 31)]);
        assert_eq!(order.quantities_by_product(), None);
    }
}
