use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::value_objects::{Money, Quantity};

// ============================================================================
// Order Value Objects
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Open,
    Completed,
    Cancelled,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::Open => "open",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderItemStatus {
    Pending,
    Ready,
    Cancelled,
}

impl fmt::Display for OrderItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderItemStatus::Pending => "pending",
            OrderItemStatus::Ready => "ready",
            OrderItemStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// A line of an order, tracked through the kitchen
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub id: String,
    pub menu_item_id: String,
    pub name: String,
    pub unit_price: Money,
    pub quantity: Quantity,
    pub status: OrderItemStatus,
}

impl OrderItem {
    pub fn total_price(&self) -> Money {
        self.unit_price * self.quantity
    }

    pub fn is_active(&self) -> bool {
        self.status != OrderItemStatus::Cancelled
    }
}

/// Requested line when placing an order, unvalidated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemRequest {
    pub menu_item_id: String,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: i64,
}

// ============================================================================
// Unit Tests
// ============================================================================
