//! Item master data

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unit used when an item request leaves it blank
pub const DEFAULT_UNIT: &str = "pcs";

/// A stocked item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub unit: String,
    pub purchase_price: Decimal,
    pub sale_price: Decimal,
}

/// Request body for creating or updating an item. The code is generated on
/// create and never changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemRequest {
    pub name: String,
    #[serde(default)]
    pub unit: Option<String>,
    pub purchase_price: Decimal,
    pub sale_price: Decimal,
}

impl ItemRequest {
    /// Trimmed unit, falling back to [`DEFAULT_UNIT`]
    pub fn unit_or_default(&self) -> String {
        self.unit
            .as_deref()
            .map(str::trim)
            .filter(|unit| !unit.is_empty())
            .unwrap_or(DEFAULT_UNIT)
            .to_string()
    }
}

/// Item fields embedded in stock and line responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemSummary {
    pub code: String,
    pub name: String,
    pub unit: String,
}

impl From<&Item> for ItemSummary {
    fn from(item: &Item) -> Self {
        Self {
            code: item.code.clone(),
            name: item.name.clone(),
            unit: item.unit.clone(),
        }
    }
}
