//! In-memory inventory store
//!
//! Mirrors the PostgreSQL store's semantics without a database: each item has
//! an async mutex standing in for its row lock, and a unit of work stages its
//! changes until commit. Used by tests and local demos.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::{
    DashboardStats, DateRange, Item, ItemSummary, StockHistoryEntry, StockLevel,
    TopSellingItem, TransactionHeader, TransactionKind, TransactionLine, TOP_SELLING_LIMIT,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

use super::{InventoryStore, NewHistoryEntry, NewTransaction, UnitOfWork};
use crate::error::{AppError, AppResult};

/// In-memory store shared between clones
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<MemoryState>,
    item_locks: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
    lock_timeout: Duration,
}

#[derive(Default)]
struct MemoryState {
    items: HashMap<Uuid, Item>,
    levels: HashMap<Uuid, (i64, DateTime<Utc>)>,
    history: Vec<StockHistoryEntry>,
    transactions: Vec<TransactionHeader>,
}

/// Staged changes plus the item locks held by one unit of work
pub struct MemoryUnitOfWork {
    inner: Arc<Inner>,
    guards: HashMap<Uuid, OwnedMutexGuard<()>>,
    deltas: HashMap<Uuid, i64>,
    history: Vec<StockHistoryEntry>,
    transactions: Vec<TransactionHeader>,
}

impl Inner {
    fn state(&self) -> AppResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| AppError::Storage("memory store state poisoned".to_string()))
    }

    fn item_lock(&self, item_id: Uuid) -> AppResult<Arc<tokio::sync::Mutex<()>>> {
        let mut locks = self
            .item_locks
            .lock()
            .map_err(|_| AppError::Storage("memory store lock table poisoned".to_string()))?;
        Ok(locks.entry(item_id).or_default().clone())
    }
}

impl MemoryState {
    fn item_summary(&self, item_id: Uuid) -> Option<ItemSummary> {
        self.items.get(&item_id).map(ItemSummary::from)
    }

    fn level(&self, item: &Item) -> StockLevel {
        let (quantity_on_hand, updated_at) = match self.levels.get(&item.id) {
            Some((quantity, updated_at)) => (*quantity, Some(*updated_at)),
            None => (0, None),
        };
        StockLevel {
            item_id: item.id,
            quantity_on_hand,
            updated_at,
            item: Some(ItemSummary::from(item)),
        }
    }

    fn code_taken(&self, code: &str) -> bool {
        self.items.values().any(|item| item.code == code)
    }

    fn item_referenced(&self, item_id: Uuid) -> bool {
        self.levels.contains_key(&item_id)
            || self.history.iter().any(|entry| entry.item_id == item_id)
            || self
                .transactions
                .iter()
                .flat_map(|t| t.lines.iter())
                .any(|line| line.item_id == item_id)
    }

    fn top_selling(&self) -> Vec<TopSellingItem> {
        let mut sold: HashMap<Uuid, i64> = HashMap::new();
        for line in self
            .transactions
            .iter()
            .filter(|t| t.kind == TransactionKind::Sale)
            .flat_map(|t| t.lines.iter())
        {
            *sold.entry(line.item_id).or_insert(0) += line.quantity;
        }

        let mut ranked: Vec<TopSellingItem> = sold
            .into_iter()
            .filter_map(|(item_id, quantity_sold)| {
                self.items.get(&item_id).map(|item| TopSellingItem {
                    item_id,
                    code: item.code.clone(),
                    name: item.name.clone(),
                    quantity_sold,
                })
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.quantity_sold
                .cmp(&a.quantity_sold)
                .then_with(|| a.code.cmp(&b.code))
        });
        ranked.truncate(TOP_SELLING_LIMIT);
        ranked
    }

    fn document_taken(&self, document_number: &str) -> bool {
        self.transactions
            .iter()
            .any(|t| t.document_number == document_number)
    }
}

impl MemoryStore {
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(MemoryState::default()),
                item_locks: Mutex::new(HashMap::new()),
                lock_timeout,
            }),
        }
    }

    /// Register an item as master data
    pub fn insert_item(&self, item: Item) -> AppResult<()> {
        self.inner.state()?.items.insert(item.id, item);
        Ok(())
    }

    /// Seed an item's committed quantity directly, bypassing history
    pub fn set_quantity(&self, item_id: Uuid, quantity: i64) -> AppResult<()> {
        self.inner
            .state()?
            .levels
            .insert(item_id, (quantity, Utc::now()));
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    type Tx = MemoryUnitOfWork;

    async fn begin(&self) -> AppResult<MemoryUnitOfWork> {
        Ok(MemoryUnitOfWork {
            inner: self.inner.clone(),
            guards: HashMap::new(),
            deltas: HashMap::new(),
            history: Vec::new(),
            transactions: Vec::new(),
        })
    }

    async fn ping(&self) -> AppResult<()> {
        self.inner.state().map(|_| ())
    }

    async fn get_item(&self, item_id: Uuid) -> AppResult<Option<Item>> {
        Ok(self.inner.state()?.items.get(&item_id).cloned())
    }

    async fn list_items(&self, search: Option<&str>) -> AppResult<Vec<Item>> {
        let needle = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        let state = self.inner.state()?;
        let mut items: Vec<Item> = state
            .items
            .values()
            .filter(|item| {
                needle.as_deref().map_or(true, |needle| {
                    item.code.to_lowercase().contains(needle)
                        || item.name.to_lowercase().contains(needle)
                })
            })
            .cloned()
            .collect();
        items.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(items)
    }

    async fn create_item(&self, item: &Item) -> AppResult<()> {
        let mut state = self.inner.state()?;
        if state.code_taken(&item.code) {
            return Err(AppError::Conflict(format!(
                "Item code {} already exists",
                item.code
            )));
        }
        state.items.insert(item.id, item.clone());
        Ok(())
    }

    async fn update_item(&self, item: &Item) -> AppResult<Option<Item>> {
        let mut state = self.inner.state()?;
        let Some(existing) = state.items.get_mut(&item.id) else {
            return Ok(None);
        };
        existing.name = item.name.clone();
        existing.unit = item.unit.clone();
        existing.purchase_price = item.purchase_price;
        existing.sale_price = item.sale_price;
        Ok(Some(existing.clone()))
    }

    async fn delete_item(&self, item_id: Uuid) -> AppResult<bool> {
        let mut state = self.inner.state()?;
        if !state.items.contains_key(&item_id) {
            return Ok(false);
        }
        if state.item_referenced(item_id) {
            return Err(AppError::Conflict(format!(
                "Item {} has stock records and cannot be deleted",
                item_id
            )));
        }
        state.items.remove(&item_id);
        Ok(true)
    }

    async fn dashboard_stats(&self) -> AppResult<DashboardStats> {
        let state = self.inner.state()?;
        let mut total_stock = 0i64;
        let mut total_asset_value = Decimal::ZERO;

        for item in state.items.values() {
            let quantity = state.levels.get(&item.id).map(|(q, _)| *q).unwrap_or(0);
            total_stock += quantity;
            total_asset_value = item
                .purchase_price
                .checked_mul(Decimal::from(quantity))
                .and_then(|value| total_asset_value.checked_add(value))
                .ok_or_else(|| AppError::Storage("asset value overflow".to_string()))?;
        }

        Ok(DashboardStats {
            total_items: state.items.len() as i64,
            total_stock,
            total_asset_value,
            top_selling: state.top_selling(),
        })
    }

    async fn current_quantity(&self, item_id: Uuid) -> AppResult<i64> {
        Ok(self
            .inner
            .state()?
            .levels
            .get(&item_id)
            .map(|(quantity, _)| *quantity)
            .unwrap_or(0))
    }

    async fn stock_level(&self, item_id: Uuid) -> AppResult<Option<StockLevel>> {
        let state = self.inner.state()?;
        Ok(state.items.get(&item_id).map(|item| state.level(item)))
    }

    async fn list_stock_levels(&self) -> AppResult<Vec<StockLevel>> {
        let state = self.inner.state()?;
        let mut items: Vec<&Item> = state.items.values().collect();
        items.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(items.into_iter().map(|item| state.level(item)).collect())
    }

    async fn list_history(&self, item_id: Option<Uuid>) -> AppResult<Vec<StockHistoryEntry>> {
        let state = self.inner.state()?;
        Ok(state
            .history
            .iter()
            .rev()
            .filter(|entry| item_id.map_or(true, |id| entry.item_id == id))
            .cloned()
            .collect())
    }

    async fn get_transaction(
        &self,
        kind: TransactionKind,
        id: Uuid,
    ) -> AppResult<Option<TransactionHeader>> {
        let state = self.inner.state()?;
        Ok(state
            .transactions
            .iter()
            .find(|t| t.id == id && t.kind == kind)
            .cloned())
    }

    async fn list_transactions(
        &self,
        kind: TransactionKind,
        range: Option<DateRange>,
    ) -> AppResult<Vec<TransactionHeader>> {
        let state = self.inner.state()?;
        Ok(state
            .transactions
            .iter()
            .rev()
            .filter(|t| t.kind == kind)
            .filter(|t| range.map_or(true, |r| r.contains(t.created_at)))
            .map(|t| TransactionHeader {
                lines: Vec::new(),
                ..t.clone()
            })
            .collect())
    }
}

impl MemoryUnitOfWork {
    async fn ensure_locked(&mut self, item_id: Uuid) -> AppResult<()> {
        if self.guards.contains_key(&item_id) {
            return Ok(());
        }
        let lock = self.inner.item_lock(item_id)?;
        let guard = tokio::time::timeout(self.inner.lock_timeout, lock.lock_owned())
            .await
            .map_err(|_| AppError::LockTimeout)?;
        self.guards.insert(item_id, guard);
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn lock_quantity(&mut self, item_id: Uuid) -> AppResult<i64> {
        self.ensure_locked(item_id).await?;
        let committed = self
            .inner
            .state()?
            .levels
            .get(&item_id)
            .map(|(quantity, _)| *quantity)
            .unwrap_or(0);
        Ok(committed + self.deltas.get(&item_id).copied().unwrap_or(0))
    }

    async fn apply_delta(&mut self, item_id: Uuid, delta: i64) -> AppResult<()> {
        self.ensure_locked(item_id).await?;
        *self.deltas.entry(item_id).or_insert(0) += delta;
        Ok(())
    }

    async fn append_history(&mut self, entry: &NewHistoryEntry) -> AppResult<()> {
        self.history.push(StockHistoryEntry {
            id: Uuid::new_v4(),
            item_id: entry.item_id,
            user_id: entry.user_id,
            kind: entry.kind,
            quantity: entry.quantity,
            quantity_before: entry.quantity_before,
            quantity_after: entry.quantity_after,
            note: entry.note.clone(),
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn insert_transaction(
        &mut self,
        transaction: &NewTransaction,
    ) -> AppResult<TransactionHeader> {
        let state = self.inner.state()?;
        let staged_taken = self
            .transactions
            .iter()
            .any(|t| t.document_number == transaction.document_number);
        if staged_taken || state.document_taken(&transaction.document_number) {
            return Err(AppError::DuplicateDocument(
                transaction.document_number.clone(),
            ));
        }

        let header = TransactionHeader {
            id: Uuid::new_v4(),
            kind: transaction.kind,
            document_number: transaction.document_number.clone(),
            counterparty: transaction.counterparty.clone(),
            total: transaction.total,
            user_id: transaction.user_id,
            status: transaction.status,
            created_at: Utc::now(),
            lines: transaction
                .lines
                .iter()
                .map(|line| TransactionLine {
                    id: Uuid::new_v4(),
                    item_id: line.item_id,
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    subtotal: line.subtotal,
                    item: state.item_summary(line.item_id),
                })
                .collect(),
        };
        drop(state);

        self.transactions.push(header.clone());
        Ok(header)
    }

    async fn commit(mut self) -> AppResult<()> {
        let mut state = self.inner.state()?;

        // Two units may race on the same document number; the first commit wins.
        for transaction in &self.transactions {
            if state.document_taken(&transaction.document_number) {
                return Err(AppError::DuplicateDocument(
                    transaction.document_number.clone(),
                ));
            }
        }

        let now = Utc::now();
        for (item_id, delta) in self.deltas.drain() {
            let level = state.levels.entry(item_id).or_insert((0, now));
            level.0 += delta;
            level.1 = now;
        }
        state.history.append(&mut self.history);
        state.transactions.append(&mut self.transactions);
        drop(state);

        // Item locks are released only after the changes are visible.
        self.guards.clear();
        Ok(())
    }
}
