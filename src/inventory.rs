//! Stock reservation: reserve on placement, settle when an order leaves the
//! fulfilment pipeline. Testable without HTTP.
//!
//! Every function here computes new inventory records and leaves the input
//! untouched, so callers can persist before committing.

use std::collections::HashMap;

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::types::catalog::Inventory;
use crate::types::order::{MAX_QTY, OrderStatus, Qty};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: Uuid,
        requested: Qty,
        available: Qty,
    },
    #[error("Quantity {quantity} is below reserved quantity {reserved} for product {product_id}")]
    BelowReserved {
        product_id: Uuid,
        quantity: Qty,
        reserved: Qty,
    },
    #[error("Quantity {quantity} exceeds the maximum of {max}")]
    QuantityTooLarge { quantity: Qty, max: Qty },
}

/// What happens to an order's reserved stock when its status changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Reservation dropped, on-hand untouched.
    Release,
    /// Reservation and on-hand both reduced.
    Consume,
}

/// A reservation is settled exactly once: on the first move into cancelled,
/// completed or refunded. Completed -> refunded was already settled.
pub fn settlement_for(previous: OrderStatus, next: OrderStatus) -> Option<Settlement> {
    if previous == next {
        return None;
    }
    match (previous, next) {
        (_, OrderStatus::Cancelled) => Some(Settlement::Release),
        (OrderStatus::Completed, OrderStatus::Refunded) => None,
        (_, OrderStatus::Refunded) => Some(Settlement::Release),
        (_, OrderStatus::Completed) => Some(Settlement::Consume),
        _ => None,
    }
}

/// Reserve `lines` (product, qty) against `stock`, all or nothing. A product
/// without an inventory record has nothing available.
pub fn reserve(
    stock: &HashMap<Uuid, Inventory>,
    lines: &[(Uuid, Qty)],
) -> Result<Vec<Inventory>, InventoryError> {
    let now = Utc::now();
    let mut updated = Vec::with_capacity(lines.len());
    for &(product_id, requested) in lines {
        let Some(current) = stock.get(&product_id) else {
            return Err(InventoryError::InsufficientStock {
                product_id,
                requested,
                available: 0,
            });
        };
        let available = current.available();
        if requested > available {
            return Err(InventoryError::InsufficientStock {
                product_id,
                requested,
                available,
            });
        }
        let mut next = current.clone();
        next.reserved_quantity += requested;
        next.updated_at = now;
        updated.push(next);
    }
    Ok(updated)
}

/// Settle previously reserved `lines`. Saturates at zero so records created
/// before reservations were tracked cannot underflow.
pub fn settle(
    stock: &HashMap<Uuid, Inventory>,
    lines: &[(Uuid, Qty)],
    settlement: Settlement,
) -> Vec<Inventory> {
    let now = Utc::now();
    lines
        .iter()
        .filter_map(|&(product_id, qty)| {
            let mut next = stock.get(&product_id)?.clone();
            next.reserved_quantity = next.reserved_quantity.saturating_sub(qty);
            if settlement == Settlement::Consume {
                next.quantity = next.quantity.saturating_sub(qty);
            }
            next.updated_at = now;
            Some(next)
        })
        .collect()
}

/// On-hand quantities are capped at [`MAX_QTY`].
pub fn check_quantity(quantity: Qty) -> Result<Qty, InventoryError> {
    if quantity > MAX_QTY {
        return Err(InventoryError::QuantityTooLarge {
            quantity,
            max: MAX_QTY,
        });
    }
    Ok(quantity)
}

/// Restock or correct on-hand quantity; cannot drop below what is reserved.
pub fn set_quantity(
    current: &Inventory,
    quantity: Qty,
    location: Option<String>,
) -> Result<Inventory, InventoryError> {
    check_quantity(quantity)?;
    if quantity < current.reserved_quantity {
        return Err(InventoryError::BelowReserved {
            product_id: current.product_id,
            quantity,
            reserved: current.reserved_quantity,
        });
    }
    let mut next = current.clone();
    next.quantity = quantity;
    if location.is_some() {
        next.location = location;
    }
    next.updated_at = Utc::now();
    Ok(next)
}
