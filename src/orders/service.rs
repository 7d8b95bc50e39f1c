//! Order placement and status updates against the [`Store`].
//!
//! `plan_*` functions only read the store and return everything that has to
//! change; callers persist that and then `commit` it, all under one write lock.

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::inventory::{self, InventoryError};
use crate::orders::status::{self, OrderStatusError};
use crate::store::Store;
use crate::types::catalog::Inventory;
use crate::types::order::{Amount, MAX_QTY, Order, OrderId, OrderItem, OrderStatus, Qty};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("Order not found")]
    NotFound(OrderId),
    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Status(#[from] OrderStatusError),
    #[error(transparent)]
    Inventory(#[from] InventoryError),
}

#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub product_id: Uuid,
    pub quantity: Qty,
    pub unit_price: Amount,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: Uuid,
    pub shipping_address: String,
    pub billing_address: Option<String>,
    pub items: Vec<NewOrderLine>,
}

#[derive(Debug, Clone)]
pub struct OrderPlacement {
    pub order: Order,
    pub inventory: Vec<Inventory>,
}

#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub order: Order,
    pub previous: OrderStatus,
    pub inventory: Vec<Inventory>,
}

/// Validate a new order, price it and reserve its stock.
pub fn plan_order(store: &Store, new_order: NewOrder) -> Result<OrderPlacement, OrderError> {
    if new_order.items.is_empty() {
        return Err(OrderError::Validation(
            "At least one order item is required".into(),
        ));
    }
    if new_order.shipping_address.trim().is_empty() {
        return Err(OrderError::Validation("Shipping address is required".into()));
    }

    let order_id = Uuid::new_v4();
    let mut items = Vec::with_capacity(new_order.items.len());
    let mut total_amount: Amount = 0;
    for line in &new_order.items {
        if line.quantity == 0 {
            return Err(OrderError::Validation(
                "Quantity must be a positive number".into(),
            ));
        }
        if line.quantity > MAX_QTY {
            return Err(OrderError::Validation(format!(
                "Quantity must not exceed {MAX_QTY}"
            )));
        }
        if line.unit_price <= 0 {
            return Err(OrderError::Validation(
                "Unit price must be a positive number".into(),
            ));
        }
        match store.products.get(&line.product_id) {
            Some(p) if p.is_active => {}
            _ => return Err(OrderError::ProductNotFound(line.product_id)),
        }
        let total_price = line
            .unit_price
            .checked_mul(Amount::from(line.quantity))
            .ok_or_else(|| OrderError::Validation("Order total is too large".into()))?;
        total_amount = total_amount
            .checked_add(total_price)
            .ok_or_else(|| OrderError::Validation("Order total is too large".into()))?;
        items.push(OrderItem {
            id: Uuid::new_v4(),
            order_id,
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price: line.unit_price,
            total_price,
        });
    }

    let now = Utc::now();
    let order = Order {
        id: order_id,
        customer_id: new_order.customer_id,
        status: OrderStatus::Pending,
        total_amount,
        shipping_address: new_order.shipping_address,
        billing_address: new_order.billing_address,
        order_date: now,
        shipped_date: None,
        delivered_date: None,
        created_at: now,
        updated_at: now,
        items,
    };
    let inventory = inventory::reserve(&store.inventory, &ordered_quantities(&order)?)?;
    Ok(OrderPlacement { order, inventory })
}

/// Status change requested by an admin, canonical code or label.
pub fn plan_status_update(
    store: &Store,
    order_id: OrderId,
    requested: &str,
) -> Result<StatusUpdate, OrderError> {
    let mut order = store
        .orders
        .get(&order_id)
        .cloned()
        .ok_or(OrderError::NotFound(order_id))?;
    let previous = status::transition(&mut order, requested)?;
    settle(store, order, previous)
}

pub fn plan_delivery(store: &Store, order_id: OrderId) -> Result<StatusUpdate, OrderError> {
    let mut order = store
        .orders
        .get(&order_id)
        .cloned()
        .ok_or(OrderError::NotFound(order_id))?;
    let previous = status::confirm_delivery(&mut order)?;
    settle(store, order, previous)
}

fn ordered_quantities(order: &Order) -> Result<Vec<(Uuid, Qty)>, OrderError> {
    order.quantities_by_product().ok_or_else(|| {
        OrderError::Validation(format!(
            "Total quantity per product must not exceed {MAX_QTY}"
        ))
    })
}

fn settle(store: &Store, order: Order, previous: OrderStatus) -> Result<StatusUpdate, OrderError> {
    let inventory = match inventory::settlement_for(previous, order.status) {
        Some(settlement) => {
            inventory::settle(&store.inventory, &ordered_quantities(&order)?, settlement)
        }
        None => Vec::new(),
    };
    Ok(StatusUpdate {
        order,
        previous,
        inventory,
    })
}

impl Store {
    pub fn commit_placement(&mut self, placement: OrderPlacement) -> Order {
        self.put_inventory(placement.inventory);
        self.orders.insert(placement.order.id, placement.order.clone());
        placement.order
    }

    pub fn commit_status_update(&mut self, update: StatusUpdate) -> Order {
        self.put_inventory(update.inventory);
        self.orders.insert(update.order.id, update.order.clone());
        update.order
    }
}
