//! Vietnamese display labels for order statuses.
//!
//! The mapping is a bijection: every canonical status has exactly one label and
//! reverse lookup accepts nothing but those labels.

use crate::orders::status::OrderStatusError;
use crate::types::order::OrderStatus;

pub const ALL_STATUSES: [OrderStatus; 7] = [
    OrderStatus::Pending,
    OrderStatus::Processing,
    OrderStatus::Shipped,
    OrderStatus::Delivered,
    OrderStatus::Completed,
    OrderStatus::Cancelled,
    OrderStatus::Refunded,
];

impl OrderStatus {
    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Chờ Xử Lý",
            OrderStatus::Processing => "Đang Xử Lý",
            OrderStatus::Shipped => "Đang Giao",
            OrderStatus::Delivered => "Đã Giao",
            OrderStatus::Completed => "Hoàn Thành",
            OrderStatus::Cancelled => "Đã Hủy",
            OrderStatus::Refunded => "Đã Hoàn Tiền",
        }
    }

    /// Reverse of [`OrderStatus::label`]. Surrounding whitespace is ignored,
    /// anything else must match exactly.
    pub fn from_label(label: &str) -> Result<Self, OrderStatusError> {
        let trimmed = label.trim();
        ALL_STATUSES
            .into_iter()
            .find(|s| s.label() == trimmed)
            .ok_or_else(|| OrderStatusError::UnknownStatus(label.to_string()))
    }

    /// Normalizes request input: a canonical code (ASCII case-insensitive) or an
    /// exact label.
    pub fn parse(input: &str) -> Result<Self, OrderStatusError> {
        let trimmed = input.trim();
        if let Some(status) = OrderStatus::from_code(&trimmed.to_ascii_lowercase()) {
            return Ok(status);
        }
        OrderStatus::from_label(trimmed)
            .map_err(|_| OrderStatusError::InvalidStatus(input.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_round_trip_holds_for_every_status() {
        for status in ALL_STATUSES {
            assert_eq!(OrderStatus::from_label(status.label()), Ok(status));
            let label = status.label();
            assert_eq!(OrderStatus::from_label(label).unwrap().label(), label);
        }
    }

    #[test]
    fn labels_are_distinct() {
        for (i, a) in ALL_STATUSES.iter().enumerate() {
            for b in &ALL_STATUSES[i + 1..] {
                assert_ne!(a.label(), b.label(), "{a} and {b} share a label");
            }
        }
    }

    #[test]
    fn unknown_label_is_rejected_not_coerced() {
        assert_eq!(
            OrderStatus::from_label("Shipped"),
            Err(OrderStatusError::UnknownStatus("Shipped".into()))
        );
        assert!(OrderStatus::from_label("đang giao").is_err());
    }

    #[test]
    fn parse_accepts_codes_and_labels() {
        assert_eq!(OrderStatus::parse("processing"), Ok(OrderStatus::Processing));
        assert_eq!(OrderStatus::parse(" Shipped "), Ok(OrderStatus::Shipped));
        assert_eq!(OrderStatus::parse("Đã Hoàn Tiền"), Ok(OrderStatus::Refunded));
        assert_eq!(
            OrderStatus::parse("lost"),
            Err(OrderStatusError::InvalidStatus("lost".into()))
        );
        assert!(OrderStatus::parse("").is_err());
    }
}
