//! Dashboard summary service

use shared::DashboardStats;

use crate::error::AppResult;
use crate::store::InventoryStore;

#[derive(Clone)]
pub struct DashboardService<S> {
    store: S,
}

impl<S: InventoryStore> DashboardService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Item count, units on hand, asset value at purchase price and the
    /// best-selling items
    pub async fn stats(&self) -> AppResult<DashboardStats> {
        self.store.dashboard_stats().await
    }
}
