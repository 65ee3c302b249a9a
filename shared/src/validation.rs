//! Validation utilities for the Warehouse Stock Ledger

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{CreateTransactionRequest, ItemRequest};
use crate::types::DateRange;

/// Decimal places kept for every stored amount
pub const AMOUNT_SCALE: u32 = 2;

/// Largest amount a stored price, subtotal or total can hold
/// (`NUMERIC(18, 2)`).
pub fn max_amount() -> Decimal {
    Decimal::new(999_999_999_999_999_999, AMOUNT_SCALE)
}

/// Reasons a request is rejected before any storage is touched
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("At least one line item is required")]
    EmptyLines,

    #[error("Line {index}: quantity must be greater than 0")]
    NonPositiveQuantity { index: usize },

    #[error("Line {index}: unit price must be greater than 0")]
    NonPositivePrice { index: usize },

    #[error("Line {index}: unit price must have at most 2 decimal places")]
    PriceScale { index: usize },

    #[error("Line {index}: amount exceeds the maximum of 9999999999999999.99")]
    AmountOverflow { index: usize },

    #[error("Item name is required")]
    BlankItemName,

    #[error("{field} must be a positive amount with at most 2 decimal places")]
    InvalidItemPrice { field: &'static str },

    #[error("start_date and end_date must be provided together")]
    IncompleteDateRange,

    #[error("start_date must not be after end_date")]
    InvertedDateRange,
}

impl ValidationError {
    /// Request field the error refers to
    pub fn field(&self) -> String {
        match self {
            ValidationError::EmptyLines => "lines".to_string(),
            ValidationError::NonPositiveQuantity { index } => format!("lines[{}].quantity", index),
            ValidationError::NonPositivePrice { index } | ValidationError::PriceScale { index } => {
                format!("lines[{}].unit_price", index)
            }
            ValidationError::AmountOverflow { index } => format!("lines[{}]", index),
            ValidationError::BlankItemName => "name".to_string(),
            ValidationError::InvalidItemPrice { field } => field.to_string(),
            ValidationError::IncompleteDateRange | ValidationError::InvertedDateRange => {
                "start_date/end_date".to_string()
            }
        }
    }
}

/// Validate the shape of a purchase or sale request.
///
/// Item existence and stock sufficiency are checked by the backend.
pub fn validate_transaction_request(request: &CreateTransactionRequest) -> Result<(), ValidationError> {
    if request.lines.is_empty() {
        return Err(ValidationError::EmptyLines);
    }
    for (index, line) in request.lines.iter().enumerate() {
        if line.quantity <= 0 {
            return Err(ValidationError::NonPositiveQuantity { index });
        }
        if line.unit_price <= Decimal::ZERO {
            return Err(ValidationError::NonPositivePrice { index });
        }
        if !fits_amount_scale(line.unit_price) {
            return Err(ValidationError::PriceScale { index });
        }
        if line.unit_price > max_amount() {
            return Err(ValidationError::AmountOverflow { index });
        }
    }
    Ok(())
}

/// Validate an item create/update request
pub fn validate_item_request(request: &ItemRequest) -> Result<(), ValidationError> {
    if request.name.trim().is_empty() {
        return Err(ValidationError::BlankItemName);
    }
    for (field, price) in [
        ("purchase_price", request.purchase_price),
        ("sale_price", request.sale_price),
    ] {
        if price <= Decimal::ZERO || !fits_amount_scale(price) || price > max_amount() {
            return Err(ValidationError::InvalidItemPrice { field });
        }
    }
    Ok(())
}

fn fits_amount_scale(amount: Decimal) -> bool {
    amount.normalize().scale() <= AMOUNT_SCALE
}

/// Validate an inclusive date range
pub fn validate_date_range(range: &DateRange) -> Result<(), ValidationError> {
    if range.start > range.end {
        return Err(ValidationError::InvertedDateRange);
    }
    Ok(())
}
