//! Storage capabilities for the stock ledger and transaction records
//!
//! [`InventoryStore`] covers queries, item maintenance and opens units of work.
//! Everything that mutates stock, history or transaction records goes through
//! a [`UnitOfWork`], which either commits as a whole or is dropped, rolling
//! back every change made through it.

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::{
    DashboardStats, DateRange, Item, MovementKind, PricedLine, StockHistoryEntry, StockLevel,
    TransactionHeader, TransactionKind, TransactionStatus,
};
use uuid::Uuid;

use crate::error::AppResult;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// History entry to append inside a unit of work
#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub item_id: Uuid,
    pub user_id: Uuid,
    pub kind: MovementKind,
    pub quantity: i64,
    pub quantity_before: i64,
    pub quantity_after: i64,
    pub note: String,
}

/// Transaction header and lines to persist inside a unit of work
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub document_number: String,
    pub counterparty: String,
    pub total: Decimal,
    pub user_id: Uuid,
    pub status: TransactionStatus,
    /// Persisted in request order
    pub lines: Vec<PricedLine>,
}

/// Backing store for items, stock, history and transaction records
#[async_trait]
pub trait InventoryStore: Clone + Send + Sync + 'static {
    type Tx: UnitOfWork;

    /// Open an atomic unit of work
    async fn begin(&self) -> AppResult<Self::Tx>;

    /// Check that the backing storage answers
    async fn ping(&self) -> AppResult<()>;

    async fn get_item(&self, item_id: Uuid) -> AppResult<Option<Item>>;

    /// Items ordered by code, optionally filtered by a case-insensitive
    /// match on code or name
    async fn list_items(&self, search: Option<&str>) -> AppResult<Vec<Item>>;

    /// Fails with `Conflict` when the code is taken
    async fn create_item(&self, item: &Item) -> AppResult<()>;

    /// Replace name, unit and prices; the code is kept. `None` for an
    /// unknown item.
    async fn update_item(&self, item: &Item) -> AppResult<Option<Item>>;

    /// Remove an item that never moved stock. Returns false for an unknown
    /// item and fails with `Conflict` when stock or transactions reference it.
    async fn delete_item(&self, item_id: Uuid) -> AppResult<bool>;

    /// Warehouse-wide totals. A failing top-selling ranking degrades to an
    /// empty list.
    async fn dashboard_stats(&self) -> AppResult<DashboardStats>;

    /// Committed on-hand quantity, 0 when the item was never stocked
    async fn current_quantity(&self, item_id: Uuid) -> AppResult<i64>;

    async fn stock_level(&self, item_id: Uuid) -> AppResult<Option<StockLevel>>;

    async fn list_stock_levels(&self) -> AppResult<Vec<StockLevel>>;

    /// History newest first, optionally for one item
    async fn list_history(&self, item_id: Option<Uuid>) -> AppResult<Vec<StockHistoryEntry>>;

    /// Header with its lines
    async fn get_transaction(
        &self,
        kind: TransactionKind,
        id: Uuid,
    ) -> AppResult<Option<TransactionHeader>>;

    /// Headers newest first, without lines
    async fn list_transactions(
        &self,
        kind: TransactionKind,
        range: Option<DateRange>,
    ) -> AppResult<Vec<TransactionHeader>>;
}

/// An open atomic unit of work. Dropping it without [`UnitOfWork::commit`]
/// discards every change.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Take the item's exclusive stock lock (held until commit or drop) and
    /// return the quantity observed under it, including this unit's own
    /// uncommitted deltas.
    async fn lock_quantity(&mut self, item_id: Uuid) -> AppResult<i64>;

    /// Add `delta` to the item's quantity, creating the row seeded at
    /// `delta` when none exists.
    async fn apply_delta(&mut self, item_id: Uuid, delta: i64) -> AppResult<()>;

    /// Append one immutable history entry
    async fn append_history(&mut self, entry: &NewHistoryEntry) -> AppResult<()>;

    /// Persist a header and its lines. Fails with `DuplicateDocument` when
    /// the document number is taken.
    async fn insert_transaction(&mut self, transaction: &NewTransaction)
        -> AppResult<TransactionHeader>;

    async fn commit(self) -> AppResult<()>;
}
