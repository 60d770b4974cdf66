use super::value_objects::{OrderItemStatus, OrderStatus};
use crate::domain::errors::ValidationError;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum OrderError {
    #[error("Order must have at least one item")]
    EmptyOrder,

    #[error("Order {order_id} is {status} and cannot be modified")]
    NotOpen {
        order_id: String,
        status: OrderStatus,
    },

    #[error("Order {0} has items that are not ready")]
    NotFullyReady(String),

    #[error("Item {item_id} not found in order {order_id}")]
    ItemNotFound { order_id: String, item_id: String },

    #[error("Cannot {action} item {item_id} in status {status}")]
    InvalidItemState {
        item_id: String,
        status: OrderItemStatus,
        action: &'static str,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}
