//! Transaction orchestration shared by the purchase and sale flows
//!
//! One request becomes one unit of work: every line's stock lock, delta and
//! history entry plus the header and lines either commit together or not at
//! all.

use std::collections::BTreeSet;
use std::sync::Arc;

use shared::{
    price_lines, validate_transaction_request, CreateTransactionRequest, MovementKind, PricedLine,
    TransactionHeader, TransactionKind, TransactionStatus,
};
use uuid::Uuid;

use super::document_number::{DocumentNumberGenerator, DocumentNumberSource};
use super::ledger::StockLedger;
use super::records::TransactionRecordStore;
use crate::error::{AppError, AppResult};
use crate::store::{InventoryStore, NewHistoryEntry, NewTransaction, UnitOfWork};

/// Attempts made with freshly generated document numbers before giving up
pub const MAX_DOCUMENT_ATTEMPTS: u32 = 3;

/// Drives the ledger and record store for one transaction kind
#[derive(Clone)]
pub struct TransactionOrchestrator<S> {
    kind: TransactionKind,
    store: S,
    ledger: StockLedger<S>,
    records: TransactionRecordStore<S>,
    numbers: Arc<dyn DocumentNumberSource>,
}

impl<S: InventoryStore> TransactionOrchestrator<S> {
    pub fn new(kind: TransactionKind, store: S) -> Self {
        Self::with_numbers(kind, store, Arc::new(DocumentNumberGenerator::new()))
    }

    /// Use `numbers` for requests that do not supply a document number
    pub fn with_numbers(
        kind: TransactionKind,
        store: S,
        numbers: Arc<dyn DocumentNumberSource>,
    ) -> Self {
        Self {
            kind,
            ledger: StockLedger::new(store.clone()),
            records: TransactionRecordStore::new(store.clone()),
            numbers,
            store,
        }
    }

    pub fn records(&self) -> &TransactionRecordStore<S> {
        &self.records
    }

    /// Validate, price and atomically record a transaction
    pub async fn execute(
        &self,
        user_id: Uuid,
        request: CreateTransactionRequest,
    ) -> AppResult<TransactionHeader> {
        validate_transaction_request(&request)?;
        self.ensure_items_exist(&request).await?;

        let (lines, total) = price_lines(&request.lines)?;
        let counterparty = request.counterparty.trim().to_string();
        let supplied = request.supplied_document_number();

        let mut attempt = 1;
        loop {
            let document_number = supplied
                .clone()
                .unwrap_or_else(|| self.numbers.next_number(self.kind));

            let transaction = NewTransaction {
                kind: self.kind,
                document_number,
                counterparty: counterparty.clone(),
                total,
                user_id,
                status: TransactionStatus::Completed,
                lines: lines.clone(),
            };

            match self.record(transaction).await {
                Err(AppError::DuplicateDocument(number))
                    if supplied.is_none() && attempt < MAX_DOCUMENT_ATTEMPTS =>
                {
                    tracing::warn!(
                        kind = %self.kind,
                        document_number = %number,
                        attempt,
                        "Generated document number collided, retrying"
                    );
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    /// Every line must reference existing master data
    async fn ensure_items_exist(&self, request: &CreateTransactionRequest) -> AppResult<()> {
        let mut checked = BTreeSet::new();
        for (index, line) in request.lines.iter().enumerate() {
            if !checked.insert(line.item_id) {
                continue;
            }
            if self.store.get_item(line.item_id).await?.is_none() {
                return Err(AppError::Validation {
                    field: format!("lines[{}].item_id", index),
                    message: format!("Item {} not found", line.item_id),
                });
            }
        }
        Ok(())
    }

    /// Run one unit of work. Returning early drops `uow`, rolling back.
    async fn record(&self, transaction: NewTransaction) -> AppResult<TransactionHeader> {
        let mut uow = self.store.begin().await?;

        // Fixed lock order across all requests prevents circular waits
        let mut ordered: Vec<&PricedLine> = transaction.lines.iter().collect();
        ordered.sort_by_key(|line| line.item_id);

        for line in ordered {
            self.apply_line(&mut uow, &transaction, line).await?;
        }

        let header = self.records.create(&mut uow, &transaction).await?;
        uow.commit().await?;

        tracing::info!(
            kind = %self.kind,
            document_number = %header.document_number,
            total = %header.total,
            lines = header.lines.len(),
            "Transaction committed"
        );

        Ok(header)
    }

    async fn apply_line(
        &self,
        uow: &mut S::Tx,
        transaction: &NewTransaction,
        line: &PricedLine,
    ) -> AppResult<()> {
        let movement = self.kind.movement();
        let before = self.ledger.lock_quantity(uow, line.item_id).await?;

        if movement == MovementKind::Out && before < line.quantity {
            tracing::warn!(
                document_number = %transaction.document_number,
                item_id = %line.item_id,
                available = before,
                requested = line.quantity,
                "Sale rejected: insufficient stock"
            );
            return Err(AppError::InsufficientStock {
                item_id: line.item_id,
                available: before,
                requested: line.quantity,
            });
        }

        let delta = movement.signed(line.quantity);
        let after = before.checked_add(delta).ok_or_else(|| AppError::Validation {
            field: "lines.quantity".to_string(),
            message: format!("Quantity for item {} exceeds the stock counter range", line.item_id),
        })?;

        self.ledger.apply_delta(uow, line.item_id, delta).await?;
        self.ledger
            .record_history(
                uow,
                &NewHistoryEntry {
                    item_id: line.item_id,
                    user_id: transaction.user_id,
                    kind: movement,
                    quantity: line.quantity,
                    quantity_before: before,
                    quantity_after: after,
                    note: format!("{} {}", self.kind.label(), transaction.document_number),
                },
            )
            .await
    }
}
