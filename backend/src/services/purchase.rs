//! Purchase (stock-in) service

use shared::{CreateTransactionRequest, DateRange, TransactionHeader, TransactionKind};
use std::sync::Arc;
use uuid::Uuid;

use super::document_number::DocumentNumberSource;
use super::orchestrator::TransactionOrchestrator;
use crate::error::AppResult;
use crate::store::InventoryStore;

/// Purchase service for recording goods received from suppliers
#[derive(Clone)]
pub struct PurchaseService<S> {
    orchestrator: TransactionOrchestrator<S>,
}

impl<S: InventoryStore> PurchaseService<S> {
    /// Create a new PurchaseService instance
    pub fn new(store: S) -> Self {
        Self {
            orchestrator: TransactionOrchestrator::new(TransactionKind::Purchase, store),
        }
    }

    /// Create a PurchaseService drawing generated document numbers from `numbers`
    pub fn with_numbers(store: S, numbers: Arc<dyn DocumentNumberSource>) -> Self {
        Self {
            orchestrator: TransactionOrchestrator::with_numbers(
                TransactionKind::Purchase,
                store,
                numbers,
            ),
        }
    }

    /// Record a purchase and add every line's quantity to stock
    pub async fn create(
        &self,
        user_id: Uuid,
        request: CreateTransactionRequest,
    ) -> AppResult<TransactionHeader> {
        self.orchestrator.execute(user_id, request).await
    }

    /// Get a purchase with its lines
    pub async fn get(&self, id: Uuid) -> AppResult<TransactionHeader> {
        self.orchestrator
            .records()
            .get_by_id(TransactionKind::Purchase, id)
            .await
    }

    /// List purchases, optionally within a date range
    pub async fn list(&self, range: Option<DateRange>) -> AppResult<Vec<TransactionHeader>> {
        self.orchestrator
            .records()
            .list_by_date_range(TransactionKind::Purchase, range)
            .await
    }
}
