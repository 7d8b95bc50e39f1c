//! Order engine: status lifecycle, localized labels, placement and status updates.

pub mod labels;
pub mod service;
pub mod status;

pub use labels::ALL_STATUSES;
pub use service::{
    NewOrder, NewOrderLine, OrderError, OrderPlacement, StatusUpdate, plan_delivery, plan_order,
    plan_status_update,
};
pub use status::{OrderStatusError, allowed_targets, can_transition, confirm_delivery, transition};
