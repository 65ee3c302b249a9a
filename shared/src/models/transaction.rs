//! Purchase and sale transaction models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{ItemSummary, MovementKind};
use crate::validation::{max_amount, ValidationError};

/// Kind of stock transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Stock-in from a supplier
    Purchase,
    /// Stock-out to a customer
    Sale,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Purchase => "purchase",
            TransactionKind::Sale => "sale",
        }
    }

    /// Prefix used in generated document numbers
    pub fn document_prefix(&self) -> &'static str {
        match self {
            TransactionKind::Purchase => "PUR",
            TransactionKind::Sale => "SAL",
        }
    }

    /// Ledger direction of every line in a transaction of this kind
    pub fn movement(&self) -> MovementKind {
        match self {
            TransactionKind::Purchase => MovementKind::In,
            TransactionKind::Sale => MovementKind::Out,
        }
    }

    /// Human label used in history notes and messages
    pub fn label(&self) -> &'static str {
        match self {
            TransactionKind::Purchase => "Purchase",
            TransactionKind::Sale => "Sale",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "purchase" => Ok(TransactionKind::Purchase),
            "sale" => Ok(TransactionKind::Sale),
            other => Err(format!("unknown transaction kind: {}", other)),
        }
    }
}

/// Transaction lifecycle status. Headers are final once written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Completed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Completed => "completed",
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(TransactionStatus::Completed),
            other => Err(format!("unknown transaction status: {}", other)),
        }
    }
}

/// One requested line of a purchase or sale
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionLineInput {
    pub item_id: Uuid,
    pub quantity: i64,
    pub unit_price: Decimal,
}

/// Request body for creating a purchase or sale
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateTransactionRequest {
    /// Generated when absent or blank
    #[serde(default)]
    pub document_number: Option<String>,
    /// Supplier for purchases, customer for sales
    #[serde(default)]
    pub counterparty: String,
    pub lines: Vec<TransactionLineInput>,
}

impl CreateTransactionRequest {
    /// Caller-supplied document number, trimmed, if any
    pub fn supplied_document_number(&self) -> Option<String> {
        self.document_number
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

/// A validated line with its computed subtotal
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub item_id: Uuid,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

/// Compute `subtotal = quantity * unit_price` per line and the header total.
/// Line order is preserved.
///
/// Fails with `AmountOverflow` for the first line whose subtotal, or the
/// running total up to it, exceeds the storable amount range.
pub fn price_lines(
    lines: &[TransactionLineInput],
) -> Result<(Vec<PricedLine>, Decimal), ValidationError> {
    let limit = max_amount();
    let mut priced = Vec::with_capacity(lines.len());
    let mut total = Decimal::ZERO;

    for (index, line) in lines.iter().enumerate() {
        let subtotal = Decimal::from(line.quantity)
            .checked_mul(line.unit_price)
            .filter(|subtotal| subtotal.abs() <= limit)
            .ok_or(ValidationError::AmountOverflow { index })?;
        total = total
            .checked_add(subtotal)
            .filter(|total| total.abs() <= limit)
            .ok_or(ValidationError::AmountOverflow { index })?;

        priced.push(PricedLine {
            item_id: line.item_id,
            quantity: line.quantity,
            unit_price: line.unit_price,
            subtotal,
        });
    }

    Ok((priced, total))
}

/// A persisted transaction line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionLine {
    pub id: Uuid,
    pub item_id: Uuid,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<ItemSummary>,
}

/// A persisted purchase or sale header with its lines
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionHeader {
    pub id: Uuid,
    pub kind: TransactionKind,
    pub document_number: String,
    pub counterparty: String,
    pub total: Decimal,
    pub user_id: Uuid,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    /// Empty in list views
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<TransactionLine>,
}

impl TransactionHeader {
    /// Sum of line subtotals
    pub fn lines_total(&self) -> Decimal {
        self.lines.iter().map(|line| line.subtotal).sum()
    }
}
