//! Dashboard summary

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of entries in the top-selling list
pub const TOP_SELLING_LIMIT: usize = 5;

/// An item ranked by total quantity sold
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopSellingItem {
    pub item_id: Uuid,
    pub code: String,
    pub name: String,
    pub quantity_sold: i64,
}

/// Warehouse-wide totals
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardStats {
    pub total_items: i64,
    /// Units on hand across all items
    pub total_stock: i64,
    /// Σ purchase_price × quantity_on_hand
    pub total_asset_value: Decimal,
    /// Empty when the ranking could not be computed
    pub top_selling: Vec<TopSellingItem>,
}
