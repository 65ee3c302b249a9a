//! HTTP handlers for stock levels and movement history

use axum::{
    extract::{rejection::PathRejection, Path, State},
    Json,
};
use shared::{ApiResponse, StockHistoryEntry, StockLevel};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::StockLedger;
use crate::store::InventoryStore;
use crate::AppState;

/// List stock levels for every item
pub async fn list_stock<S: InventoryStore>(
    State(state): State<AppState<S>>,
    _current_user: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<StockLevel>>>> {
    let ledger = StockLedger::new(state.store);
    let levels = ledger.list_levels().await?;
    Ok(Json(ApiResponse::success("Stock levels retrieved", levels)))
}

/// Get the stock level of one item
pub async fn get_stock<S: InventoryStore>(
    State(state): State<AppState<S>>,
    _current_user: CurrentUser,
    item_id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<ApiResponse<StockLevel>>> {
    let Path(item_id) = item_id?;
    let ledger = StockLedger::new(state.store);
    let level = ledger.level(item_id).await?;
    Ok(Json(ApiResponse::success("Stock level retrieved", level)))
}

/// All stock movements, newest first
pub async fn list_stock_history<S: InventoryStore>(
    State(state): State<AppState<S>>,
    _current_user: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<StockHistoryEntry>>>> {
    let ledger = StockLedger::new(state.store);
    let history = ledger.history(None).await?;
    Ok(Json(ApiResponse::success("Stock history retrieved", history)))
}

/// Stock movements of one item, newest first
pub async fn get_item_history<S: InventoryStore>(
    State(state): State<AppState<S>>,
    _current_user: CurrentUser,
    item_id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<ApiResponse<Vec<StockHistoryEntry>>>> {
    let Path(item_id) = item_id?;
    let ledger = StockLedger::new(state.store);
    let history = ledger.history(Some(item_id)).await?;
    Ok(Json(ApiResponse::success("Stock history retrieved", history)))
}
