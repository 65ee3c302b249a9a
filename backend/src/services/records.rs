//! Transaction record store: purchase and sale headers with their lines

use shared::{validate_date_range, DateRange, TransactionHeader, TransactionKind};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::{InventoryStore, NewTransaction, UnitOfWork};

#[derive(Clone)]
pub struct TransactionRecordStore<S> {
    store: S,
}

impl<S: InventoryStore> TransactionRecordStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Persist a header and its lines inside `uow`
    pub async fn create(
        &self,
        uow: &mut S::Tx,
        transaction: &NewTransaction,
    ) -> AppResult<TransactionHeader> {
        uow.insert_transaction(transaction).await
    }

    pub async fn get_by_id(&self, kind: TransactionKind, id: Uuid) -> AppResult<TransactionHeader> {
        self.store
            .get_transaction(kind, id)
            .await?
            .ok_or_else(|| AppError::NotFound(kind.label().to_string()))
    }

    /// Headers newest first; `None` lists everything
    pub async fn list_by_date_range(
        &self,
        kind: TransactionKind,
        range: Option<DateRange>,
    ) -> AppResult<Vec<TransactionHeader>> {
        if let Some(range) = &range {
            validate_date_range(range)?;
        }
        self.store.list_transactions(kind, range).await
    }
}
