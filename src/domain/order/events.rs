use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::event_sourcing::core::DomainEvent;

// ============================================================================
// Order Events - Domain Events for the Order aggregate
// ============================================================================

pub const ORDER_PLACED: &str = "OrderPlaced";
pub const ORDER_ITEM_ADDED: &str = "OrderItemAdded";
pub const DISH_MARKED_READY: &str = "DishMarkedReady";
pub const ORDER_ITEM_CANCELLED: &str = "OrderItemCancelled";
pub const ORDER_COMPLETED: &str = "OrderCompleted";
pub const ORDER_CANCELLED: &str = "OrderCancelled";

/// Order Event - serializes to the bare fields of the wrapped event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OrderEvent {
    Placed(OrderPlaced),
    ItemAdded(OrderItemAdded),
    DishReady(DishMarkedReady),
    ItemCancelled(OrderItemCancelled),
    Completed(OrderCompleted),
    Cancelled(OrderCancelled),
}

impl DomainEvent for OrderEvent {
    fn event_name(&self) -> &'static str {
        match self {
            OrderEvent::Placed(_) => ORDER_PLACED,
            OrderEvent::ItemAdded(_) => ORDER_ITEM_ADDED,
            OrderEvent::DishReady(_) => DISH_MARKED_READY,
            OrderEvent::ItemCancelled(_) => ORDER_ITEM_CANCELLED,
            OrderEvent::Completed(_) => ORDER_COMPLETED,
            OrderEvent::Cancelled(_) => ORDER_CANCELLED,
        }
    }
}

// ============================================================================
// Individual Event Types
// ============================================================================

/// Order Placed - opens the order for a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPlaced {
    pub order_id: String,
    pub table_number: u32,
}

/// Order Item Added - carries a price snapshot taken at ordering time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemAdded {
    pub order_id: String,
    pub order_item_id: String,
    pub menu_item_id: String,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DishMarkedReady {
    pub order_id: String,
    pub order_item_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemCancelled {
    pub order_id: String,
    pub order_item_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCompleted {
    pub order_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCancelled {
    pub order_id: String,
}
