//! Stock ledger models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ItemSummary;

/// Direction of a stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    In,
    Out,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::In => "in",
            MovementKind::Out => "out",
        }
    }

    /// Signed delta applied to the on-hand quantity for `quantity` units
    pub fn signed(&self, quantity: i64) -> i64 {
        match self {
            MovementKind::In => quantity,
            MovementKind::Out => -quantity,
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(MovementKind::In),
            "out" => Ok(MovementKind::Out),
            other => Err(format!("unknown movement kind: {}", other)),
        }
    }
}

/// Current stock of one item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockLevel {
    pub item_id: Uuid,
    pub quantity_on_hand: i64,
    /// `None` when the item has never been stocked
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<ItemSummary>,
}

/// Immutable audit record of one stock movement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockHistoryEntry {
    pub id: Uuid,
    pub item_id: Uuid,
    pub user_id: Uuid,
    pub kind: MovementKind,
    pub quantity: i64,
    pub quantity_before: i64,
    pub quantity_after: i64,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

impl StockHistoryEntry {
    /// Quantity with the sign of the movement applied
    pub fn signed_quantity(&self) -> i64 {
        self.kind.signed(self.quantity)
    }

    /// Whether before/after agree with the movement
    pub fn is_consistent(&self) -> bool {
        self.quantity_before + self.signed_quantity() == self.quantity_after
    }
}
