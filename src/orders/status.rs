//! Order status state machine.

use chrono::Utc;
use thiserror::Error;

use crate::types::order::{Order, OrderStatus};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderStatusError {
    #[error("Invalid status: {0}")]
    InvalidStatus(String),
    #[error("Unknown status label: {0}")]
    UnknownStatus(String),
    #[error("Invalid status transition: {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error(
        "Cannot confirm delivery for order with status: {} ({current}). Order must be in 'shipped' status.",
        .current.label()
    )]
    NotShipped { current: OrderStatus },
}

/// Statuses reachable in one step from `from`. Empty for terminal states.
pub fn allowed_targets(from: OrderStatus) -> &'static [OrderStatus] {
    use OrderStatus::*;
    match from {
        Pending => &[Processing, Cancelled],
        Processing => &[Shipped, Cancelled],
        Shipped => &[Delivered, Completed, Cancelled],
        // shipped is a correction path for deliveries confirmed by mistake
        Delivered => &[Completed, Refunded, Shipped],
        Completed => &[Refunded],
        Cancelled | Refunded => &[],
    }
}

/// Re-applying the current status is always accepted.
pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    from == to || allowed_targets(from).contains(&to)
}

/// Moves `order` to `requested` (canonical code or label) and returns the
/// status it had before.
pub fn transition(order: &mut Order, requested: &str) -> Result<OrderStatus, OrderStatusError> {
    let target = OrderStatus::parse(requested)?;
    apply(order, target)
}

/// Only `shipped -> delivered` is accepted.
pub fn confirm_delivery(order: &mut Order) -> Result<OrderStatus, OrderStatusError> {
    if order.status != OrderStatus::Shipped {
        return Err(OrderStatusError::NotShipped {
            current: order.status,
        });
    }
    apply(order, OrderStatus::Delivered)
}

fn apply(order: &mut Order, target: OrderStatus) -> Result<OrderStatus, OrderStatusError> {
    let previous = order.status;
    if !can_transition(previous, target) {
        return Err(OrderStatusError::InvalidTransition {
            from: previous,
            to: target,
        });
    }

    let now = Utc::now();
    order.status = target;
    order.updated_at = now;
    if previous != target {
        match target {
            OrderStatus::Shipped => order.shipped_date = Some(now),
            OrderStatus::Delivered => order.delivered_date = Some(now),
            _ => {}
        }
    }
    Ok(previous)
}
