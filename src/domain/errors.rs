use rust_decimal::Decimal;

use super::menu_item::MenuItemError;
use super::order::OrderError;
use crate::outbox::OutboxError;
use crate::persistence::UnitOfWorkError;

// ============================================================================
// Input Validation Errors
// ============================================================================

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    #[error("{entity}.{field} is required")]
    RequiredField {
        entity: &'static str,
        field: &'static str,
    },

    #[error("Money cannot be negative: {0}")]
    NegativeMoney(Decimal),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    #[error("Invalid table number: {0}")]
    InvalidTableNumber(i64),
}

// ============================================================================
// Command Errors
// ============================================================================
//
// Everything a command handler can surface to its caller. Nothing is
// persisted and no outbox entry is written when one of these is returned.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    MenuItem(#[from] MenuItemError),

    #[error("Order '{0}' not found")]
    OrderNotFound(String),

    #[error("Order '{0}' already exists")]
    OrderAlreadyExists(String),

    #[error("Menu item '{0}' not found")]
    MenuItemNotFound(String),

    #[error("Menu item '{0}' already exists")]
    MenuItemAlreadyExists(String),

    #[error(transparent)]
    UnitOfWork(#[from] UnitOfWorkError),

    #[error(transparent)]
    Outbox(#[from] OutboxError),
}
