//! Stock ledger: per-item on-hand counters and their append-only history

use shared::{StockHistoryEntry, StockLevel};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::{InventoryStore, NewHistoryEntry, UnitOfWork};

/// Stock ledger service
#[derive(Clone)]
pub struct StockLedger<S> {
    store: S,
}

impl<S: InventoryStore> StockLedger<S> {
    /// Create a new StockLedger instance
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Committed quantity on hand; 0 when the item was never stocked.
    ///
    /// Not suitable for decisions that lead to a write; use
    /// [`StockLedger::lock_quantity`] inside the unit of work instead.
    pub async fn current_quantity(&self, item_id: Uuid) -> AppResult<i64> {
        self.store.current_quantity(item_id).await
    }

    /// Lock the item's stock row for the rest of `uow` and read its quantity
    pub async fn lock_quantity(&self, uow: &mut S::Tx, item_id: Uuid) -> AppResult<i64> {
        uow.lock_quantity(item_id).await
    }

    /// Apply a signed quantity delta inside `uow`
    pub async fn apply_delta(&self, uow: &mut S::Tx, item_id: Uuid, delta: i64) -> AppResult<()> {
        uow.apply_delta(item_id, delta).await
    }

    /// Append one immutable history entry inside `uow`
    pub async fn record_history(&self, uow: &mut S::Tx, entry: &NewHistoryEntry) -> AppResult<()> {
        uow.append_history(entry).await
    }

    /// Stock level of a single item
    pub async fn level(&self, item_id: Uuid) -> AppResult<StockLevel> {
        self.store
            .stock_level(item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Item".to_string()))
    }

    /// Stock levels of all items, including never-stocked ones at 0
    pub async fn list_levels(&self) -> AppResult<Vec<StockLevel>> {
        self.store.list_stock_levels().await
    }

    /// Stock movements newest first, optionally for one item
    pub async fn history(&self, item_id: Option<Uuid>) -> AppResult<Vec<StockHistoryEntry>> {
        if let Some(id) = item_id {
            if self.store.get_item(id).await?.is_none() {
                return Err(AppError::NotFound("Item".to_string()));
            }
        }
        self.store.list_history(item_id).await
    }
}
