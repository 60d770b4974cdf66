use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::ops::Mul;

use super::errors::ValidationError;

// ============================================================================
// Shared Value Objects
// ============================================================================

/// Non-negative monetary amount with exact decimal arithmetic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    pub fn new(amount: Decimal) -> Result<Self, ValidationError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(ValidationError::NegativeMoney(amount));
        }
        Ok(Self(amount))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }
}

impl Mul<Quantity> for Money {
    type Output = Money;

    fn mul(self, quantity: Quantity) -> Money {
        Money(self.0 * Decimal::from(quantity.value()))
    }
}

/// Strictly positive item count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        match u32::try_from(value) {
            Ok(v) if v > 0 => Ok(Self(v)),
            _ => Err(ValidationError::InvalidQuantity(value)),
        }
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

/// Restaurant table, numbered from 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableNumber(u32);

impl TableNumber {
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        match u32::try_from(value) {
            Ok(v) if v > 0 => Ok(Self(v)),
            _ => Err(ValidationError::InvalidTableNumber(value)),
        }
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

/// Reject blank strings for required text fields
pub(crate) fn required_text(
    entity: &'static str,
    field: &'static str,
    value: &str,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::RequiredField { entity, field });
    }
    Ok(trimmed.to_string())
}

// ============================================================================
// Unit Tests
// ============================================================================
