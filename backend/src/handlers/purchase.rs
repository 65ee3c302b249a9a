//! HTTP handlers for purchase (stock-in) endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use shared::{ApiResponse, CreateTransactionRequest, TransactionHeader};
use uuid::Uuid;

use super::DateRangeQuery;
use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::PurchaseService;
use crate::store::InventoryStore;
use crate::AppState;

/// Record a purchase
pub async fn create_purchase<S: InventoryStore>(
    State(state): State<AppState<S>>,
    current_user: CurrentUser,
    payload: Result<Json<CreateTransactionRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<TransactionHeader>>)> {
    let Json(request) = payload?;
    let service = PurchaseService::new(state.store);
    let purchase = service.create(current_user.0.user_id, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Purchase recorded", purchase)),
    ))
}

/// Get a purchase with its lines
pub async fn get_purchase<S: InventoryStore>(
    State(state): State<AppState<S>>,
    _current_user: CurrentUser,
    purchase_id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<ApiResponse<TransactionHeader>>> {
    let Path(purchase_id) = purchase_id?;
    let service = PurchaseService::new(state.store);
    let purchase = service.get(purchase_id).await?;
    Ok(Json(ApiResponse::success("Purchase retrieved", purchase)))
}

/// List purchases, optionally filtered by `start_date` and `end_date`
pub async fn list_purchases<S: InventoryStore>(
    State(state): State<AppState<S>>,
    _current_user: CurrentUser,
    query: Result<Query<DateRangeQuery>, QueryRejection>,
) -> AppResult<Json<ApiResponse<Vec<TransactionHeader>>>> {
    let Query(query) = query?;
    let service = PurchaseService::new(state.store);
    let purchases = service.list(query.into_range()?).await?;
    Ok(Json(ApiResponse::success("Purchases retrieved", purchases)))
}
