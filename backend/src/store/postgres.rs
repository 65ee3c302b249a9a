//! PostgreSQL-backed inventory store
//!
//! Per-item serialization uses row locks on `stock_levels`: a placeholder row
//! is upserted so that never-stocked items can be locked too, then the row is
//! read `FOR UPDATE`. Lock waits are bounded by `lock_timeout`, set per unit
//! of work.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use shared::{
    DashboardStats, DateRange, Item, ItemSummary, StockHistoryEntry, StockLevel, TopSellingItem,
    TransactionHeader, TransactionKind, TransactionLine, TOP_SELLING_LIMIT,
};
use sqlx::{postgres::PgExecutor, FromRow, PgPool, Postgres, Transaction};
use std::time::Duration;
use uuid::Uuid;

use super::{InventoryStore, NewHistoryEntry, NewTransaction, UnitOfWork};
use crate::error::{AppError, AppResult};

/// SQLSTATE lock_not_available, raised when `lock_timeout` expires
const LOCK_NOT_AVAILABLE: &str = "55P03";
/// SQLSTATE deadlock_detected
const DEADLOCK_DETECTED: &str = "40P01";

/// Inventory store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
    lock_timeout: Duration,
}

/// Unit of work wrapping a database transaction. Dropping it rolls back.
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    code: String,
    name: String,
    unit: String,
    purchase_price: Decimal,
    sale_price: Decimal,
}

#[derive(Debug, FromRow)]
struct TotalsRow {
    total_items: i64,
    total_stock: i64,
    total_asset_value: Decimal,
}

#[derive(Debug, FromRow)]
struct TopSellingRow {
    item_id: Uuid,
    code: String,
    name: String,
    quantity_sold: i64,
}

impl From<TopSellingRow> for TopSellingItem {
    fn from(row: TopSellingRow) -> Self {
        TopSellingItem {
            item_id: row.item_id,
            code: row.code,
            name: row.name,
            quantity_sold: row.quantity_sold,
        }
    }
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Item {
            id: row.id,
            code: row.code,
            name: row.name,
            unit: row.unit,
            purchase_price: row.purchase_price,
            sale_price: row.sale_price,
        }
    }
}

/// Row for stock level queries
#[derive(Debug, FromRow)]
struct StockLevelRow {
    item_id: Uuid,
    quantity_on_hand: i64,
    updated_at: Option<DateTime<Utc>>,
    code: String,
    name: String,
    unit: String,
}

impl From<StockLevelRow> for StockLevel {
    fn from(row: StockLevelRow) -> Self {
        StockLevel {
            item_id: row.item_id,
            quantity_on_hand: row.quantity_on_hand,
            updated_at: row.updated_at,
            item: Some(ItemSummary {
                code: row.code,
                name: row.name,
                unit: row.unit,
            }),
        }
    }
}

#[derive(Debug, FromRow)]
struct HistoryRow {
    id: Uuid,
    item_id: Uuid,
    user_id: Uuid,
    kind: String,
    quantity: i64,
    quantity_before: i64,
    quantity_after: i64,
    note: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<HistoryRow> for StockHistoryEntry {
    type Error = AppError;

    fn try_from(row: HistoryRow) -> Result<Self, Self::Error> {
        Ok(StockHistoryEntry {
            id: row.id,
            item_id: row.item_id,
            user_id: row.user_id,
            kind: row.kind.parse().map_err(AppError::Storage)?,
            quantity: row.quantity,
            quantity_before: row.quantity_before,
            quantity_after: row.quantity_after,
            note: row.note,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct TransactionRow {
    id: Uuid,
    kind: String,
    document_number: String,
    counterparty: String,
    total: Decimal,
    user_id: Uuid,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for TransactionHeader {
    type Error = AppError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        Ok(TransactionHeader {
            id: row.id,
            kind: row.kind.parse().map_err(AppError::Storage)?,
            document_number: row.document_number,
            counterparty: row.counterparty,
            total: row.total,
            user_id: row.user_id,
            status: row.status.parse().map_err(AppError::Storage)?,
            created_at: row.created_at,
            lines: Vec::new(),
        })
    }
}

#[derive(Debug, FromRow)]
struct LineRow {
    id: Uuid,
    item_id: Uuid,
    quantity: i64,
    unit_price: Decimal,
    subtotal: Decimal,
    code: String,
    name: String,
    unit: String,
}

impl From<LineRow> for TransactionLine {
    fn from(row: LineRow) -> Self {
        TransactionLine {
            id: row.id,
            item_id: row.item_id,
            quantity: row.quantity,
            unit_price: row.unit_price,
            subtotal: row.subtotal,
            item: Some(ItemSummary {
                code: row.code,
                name: row.name,
                unit: row.unit,
            }),
        }
    }
}

/// Translate lock failures into `LockTimeout`, everything else stays a database error
fn map_db_error(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if matches!(
            db_err.code().as_deref(),
            Some(LOCK_NOT_AVAILABLE) | Some(DEADLOCK_DETECTED)
        ) {
            return AppError::LockTimeout;
        }
    }
    AppError::DatabaseError(err)
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation())
}

async fn fetch_lines<'e, E>(executor: E, transaction_id: Uuid) -> AppResult<Vec<TransactionLine>>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, LineRow>(
        r#"
        SELECT l.id, l.item_id, l.quantity, l.unit_price, l.subtotal, i.code, i.name, i.unit
        FROM transaction_lines l
        JOIN items i ON i.id = l.item_id
        WHERE l.transaction_id = $1
        ORDER BY l.position
        "#,
    )
    .bind(transaction_id)
    .fetch_all(executor)
    .await
    .map_err(map_db_error)?;

    Ok(rows.into_iter().map(TransactionLine::from).collect())
}

impl PgStore {
    /// Create a new PgStore instance
    pub fn new(db: PgPool, lock_timeout: Duration) -> Self {
        Self { db, lock_timeout }
    }

    async fn top_selling(&self) -> AppResult<Vec<TopSellingItem>> {
        let rows = sqlx::query_as::<_, TopSellingRow>(
            r#"
            SELECT i.id AS item_id, i.code, i.name, SUM(l.quantity)::BIGINT AS quantity_sold
            FROM transaction_lines l
            JOIN transactions t ON t.id = l.transaction_id
            JOIN items i ON i.id = l.item_id
            WHERE t.kind = $1
            GROUP BY i.id, i.code, i.name
            ORDER BY quantity_sold DESC, i.code
            LIMIT $2
            "#,
        )
        .bind(TransactionKind::Sale.as_str())
        .bind(TOP_SELLING_LIMIT as i64)
        .fetch_all(&self.db)
        .await
        .map_err(map_db_error)?;

        Ok(rows.into_iter().map(TopSellingItem::from).collect())
    }
}

#[async_trait]
impl InventoryStore for PgStore {
    type Tx = PgUnitOfWork;

    async fn begin(&self) -> AppResult<PgUnitOfWork> {
        let mut tx = self.db.begin().await.map_err(map_db_error)?;

        // Scoped to this transaction only
        sqlx::query("SELECT set_config('lock_timeout', $1, true)")
            .bind(format!("{}ms", self.lock_timeout.as_millis()))
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

        Ok(PgUnitOfWork { tx })
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.db)
            .await
            .map_err(map_db_error)?;
        Ok(())
    }

    async fn get_item(&self, item_id: Uuid) -> AppResult<Option<Item>> {
        let row = sqlx::query_as::<_, ItemRow>(
            "SELECT id, code, name, unit, purchase_price, sale_price FROM items WHERE id = $1",
        )
        .bind(item_id)
        .fetch_optional(&self.db)
        .await
        .map_err(map_db_error)?;

        Ok(row.map(Item::from))
    }

    async fn list_items(&self, search: Option<&str>) -> AppResult<Vec<Item>> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));

        let rows = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, code, name, unit, purchase_price, sale_price
            FROM items
            WHERE $1::text IS NULL OR code ILIKE $1 OR name ILIKE $1
            ORDER BY code
            "#,
        )
        .bind(pattern)
        .fetch_all(&self.db)
        .await
        .map_err(map_db_error)?;

        Ok(rows.into_iter().map(Item::from).collect())
    }

    async fn create_item(&self, item: &Item) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO items (id, code, name, unit, purchase_price, sale_price)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(item.id)
        .bind(&item.code)
        .bind(&item.name)
        .bind(&item.unit)
        .bind(item.purchase_price)
        .bind(item.sale_price)
        .execute(&self.db)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                AppError::Conflict(format!("Item code {} already exists", item.code))
            } else {
                map_db_error(err)
            }
        })?;
        Ok(())
    }

    async fn update_item(&self, item: &Item) -> AppResult<Option<Item>> {
        let row = sqlx::query_as::<_, ItemRow>(
            r#"
            UPDATE items
            SET name = $2, unit = $3, purchase_price = $4, sale_price = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING id, code, name, unit, purchase_price, sale_price
            "#,
        )
        .bind(item.id)
        .bind(&item.name)
        .bind(&item.unit)
        .bind(item.purchase_price)
        .bind(item.sale_price)
        .fetch_optional(&self.db)
        .await
        .map_err(map_db_error)?;

        Ok(row.map(Item::from))
    }

    async fn delete_item(&self, item_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(item_id)
            .execute(&self.db)
            .await
            .map_err(|err| {
                if is_foreign_key_violation(&err) {
                    AppError::Conflict(format!(
                        "Item {} has stock records and cannot be deleted",
                        item_id
                    ))
                } else {
                    map_db_error(err)
                }
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn dashboard_stats(&self) -> AppResult<DashboardStats> {
        let totals = sqlx::query_as::<_, TotalsRow>(
            r#"
            SELECT COUNT(*)::BIGINT AS total_items,
                   COALESCE(SUM(s.quantity_on_hand), 0)::BIGINT AS total_stock,
                   COALESCE(SUM(i.purchase_price * COALESCE(s.quantity_on_hand, 0)), 0)
                       AS total_asset_value
            FROM items i
            LEFT JOIN stock_levels s ON s.item_id = i.id
            "#,
        )
        .fetch_one(&self.db)
        .await
        .map_err(map_db_error)?;

        let top_selling = match self.top_selling().await {
            Ok(items) => items,
            Err(err) => {
                tracing::warn!(error = %err, "Top-selling ranking unavailable");
                Vec::new()
            }
        };

        Ok(DashboardStats {
            total_items: totals.total_items,
            total_stock: totals.total_stock,
            total_asset_value: totals.total_asset_value,
            top_selling,
        })
    }

    async fn current_quantity(&self, item_id: Uuid) -> AppResult<i64> {
        let quantity = sqlx::query_scalar::<_, i64>(
            "SELECT quantity_on_hand FROM stock_levels WHERE item_id = $1",
        )
        .bind(item_id)
        .fetch_optional(&self.db)
        .await
        .map_err(map_db_error)?;

        Ok(quantity.unwrap_or(0))
    }

    async fn stock_level(&self, item_id: Uuid) -> AppResult<Option<StockLevel>> {
        let row = sqlx::query_as::<_, StockLevelRow>(
            r#"
            SELECT i.id AS item_id, COALESCE(s.quantity_on_hand, 0) AS quantity_on_hand,
                   s.updated_at, i.code, i.name, i.unit
            FROM items i
            LEFT JOIN stock_levels s ON s.item_id = i.id
            WHERE i.id = $1
            "#,
        )
        .bind(item_id)
        .fetch_optional(&self.db)
        .await
        .map_err(map_db_error)?;

        Ok(row.map(StockLevel::from))
    }

    async fn list_stock_levels(&self) -> AppResult<Vec<StockLevel>> {
        let rows = sqlx::query_as::<_, StockLevelRow>(
            r#"
            SELECT i.id AS item_id, COALESCE(s.quantity_on_hand, 0) AS quantity_on_hand,
                   s.updated_at, i.code, i.name, i.unit
            FROM items i
            LEFT JOIN stock_levels s ON s.item_id = i.id
            ORDER BY i.code
            "#,
        )
        .fetch_all(&self.db)
        .await
        .map_err(map_db_error)?;

        Ok(rows.into_iter().map(StockLevel::from).collect())
    }

    async fn list_history(&self, item_id: Option<Uuid>) -> AppResult<Vec<StockHistoryEntry>> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT id, item_id, user_id, kind, quantity, quantity_before, quantity_after,
                   note, created_at
            FROM stock_history
            WHERE $1::uuid IS NULL OR item_id = $1
            ORDER BY seq DESC
            "#,
        )
        .bind(item_id)
        .fetch_all(&self.db)
        .await
        .map_err(map_db_error)?;

        rows.into_iter().map(StockHistoryEntry::try_from).collect()
    }

    async fn get_transaction(
        &self,
        kind: TransactionKind,
        id: Uuid,
    ) -> AppResult<Option<TransactionHeader>> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, kind, document_number, counterparty, total, user_id, status, created_at
            FROM transactions
            WHERE id = $1 AND kind = $2
            "#,
        )
        .bind(id)
        .bind(kind.as_str())
        .fetch_optional(&self.db)
        .await
        .map_err(map_db_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut header = TransactionHeader::try_from(row)?;
        header.lines = fetch_lines(&self.db, header.id).await?;
        Ok(Some(header))
    }

    async fn list_transactions(
        &self,
        kind: TransactionKind,
        range: Option<DateRange>,
    ) -> AppResult<Vec<TransactionHeader>> {
        let (start, end): (Option<NaiveDate>, Option<NaiveDate>) = match range {
            Some(range) => (Some(range.start), Some(range.end)),
            None => (None, None),
        };

        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, kind, document_number, counterparty, total, user_id, status, created_at
            FROM transactions
            WHERE kind = $1
              AND ($2::date IS NULL OR (created_at AT TIME ZONE 'UTC')::date >= $2)
              AND ($3::date IS NULL OR (created_at AT TIME ZONE 'UTC')::date <= $3)
            ORDER BY created_at DESC, document_number DESC
            "#,
        )
        .bind(kind.as_str())
        .bind(start)
        .bind(end)
        .fetch_all(&self.db)
        .await
        .map_err(map_db_error)?;

        rows.into_iter().map(TransactionHeader::try_from).collect()
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn lock_quantity(&mut self, item_id: Uuid) -> AppResult<i64> {
        // Materialize the row so a never-stocked item can be locked as well.
        // Rolled back with everything else if the unit of work is dropped.
        sqlx::query(
            "INSERT INTO stock_levels (item_id, quantity_on_hand) VALUES ($1, 0) ON CONFLICT (item_id) DO NOTHING",
        )
        .bind(item_id)
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        let quantity = sqlx::query_scalar::<_, i64>(
            "SELECT quantity_on_hand FROM stock_levels WHERE item_id = $1 FOR UPDATE",
        )
        .bind(item_id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        Ok(quantity)
    }

    async fn apply_delta(&mut self, item_id: Uuid, delta: i64) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO stock_levels (item_id, quantity_on_hand, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (item_id) DO UPDATE
            SET quantity_on_hand = stock_levels.quantity_on_hand + EXCLUDED.quantity_on_hand,
                updated_at = NOW()
            "#,
        )
        .bind(item_id)
        .bind(delta)
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    async fn append_history(&mut self, entry: &NewHistoryEntry) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO stock_history (item_id, user_id, kind, quantity, quantity_before,
                                       quantity_after, note)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.item_id)
        .bind(entry.user_id)
        .bind(entry.kind.as_str())
        .bind(entry.quantity)
        .bind(entry.quantity_before)
        .bind(entry.quantity_after)
        .bind(&entry.note)
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    async fn insert_transaction(
        &mut self,
        transaction: &NewTransaction,
    ) -> AppResult<TransactionHeader> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            INSERT INTO transactions (kind, document_number, counterparty, total, user_id, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, kind, document_number, counterparty, total, user_id, status, created_at
            "#,
        )
        .bind(transaction.kind.as_str())
        .bind(&transaction.document_number)
        .bind(&transaction.counterparty)
        .bind(transaction.total)
        .bind(transaction.user_id)
        .bind(transaction.status.as_str())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                AppError::DuplicateDocument(transaction.document_number.clone())
            } else {
                map_db_error(err)
            }
        })?;

        let mut header = TransactionHeader::try_from(row)?;

        for (position, line) in transaction.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO transaction_lines (transaction_id, position, item_id, quantity,
                                               unit_price, subtotal)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(header.id)
            .bind(position as i32)
            .bind(line.item_id)
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(line.subtotal)
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_error)?;
        }

        header.lines = fetch_lines(&mut *self.tx, header.id).await?;
        Ok(header)
    }

    async fn commit(self) -> AppResult<()> {
        self.tx.commit().await.map_err(map_db_error)
    }
}
