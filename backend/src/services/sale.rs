//! Sale (stock-out) service

use shared::{CreateTransactionRequest, DateRange, TransactionHeader, TransactionKind};
use std::sync::Arc;
use uuid::Uuid;

use super::document_number::DocumentNumberSource;
use super::orchestrator::TransactionOrchestrator;
use crate::error::AppResult;
use crate::store::InventoryStore;

/// Sale service. A sale never drives recorded stock below zero.
#[derive(Clone)]
pub struct SaleService<S> {
    orchestrator: TransactionOrchestrator<S>,
}

impl<S: InventoryStore> SaleService<S> {
    /// Create a new SaleService instance
    pub fn new(store: S) -> Self {
        Self {
            orchestrator: TransactionOrchestrator::new(TransactionKind::Sale, store),
        }
    }

    /// Create a SaleService drawing generated document numbers from `numbers`
    pub fn with_numbers(store: S, numbers: Arc<dyn DocumentNumberSource>) -> Self {
        Self {
            orchestrator: TransactionOrchestrator::with_numbers(
                TransactionKind::Sale,
                store,
                numbers,
            ),
        }
    }

    /// Record a sale, failing with `InsufficientStock` when any line asks for
    /// more than is on hand
    pub async fn create(
        &self,
        user_id: Uuid,
        request: CreateTransactionRequest,
    ) -> AppResult<TransactionHeader> {
        self.orchestrator.execute(user_id, request).await
    }

    /// Get a sale with its lines
    pub async fn get(&self, id: Uuid) -> AppResult<TransactionHeader> {
        self.orchestrator
            .records()
            .get_by_id(TransactionKind::Sale, id)
            .await
    }

    /// List sales, optionally within a date range
    pub async fn list(&self, range: Option<DateRange>) -> AppResult<Vec<TransactionHeader>> {
        self.orchestrator
            .records()
            .list_by_date_range(TransactionKind::Sale, range)
            .await
    }
}
