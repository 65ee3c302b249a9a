//! HTTP handlers for sale (stock-out) endpoints

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
use crate::services::SaleService;
use crate::store::InventoryStore;
use crate::AppState;

/// Record a sale. Any line exceeding stock on hand rejects the whole sale.
pub async fn create_sale<S: InventoryStore>(
    State(state): State<AppState<S>>,
    current_user: CurrentUser,
    payload: Result<Json<CreateTransactionRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<TransactionHeader>>)> {
    let Json(request) = payload?;
    let service = SaleService::new(state.store);
    let sale = service.create(current_user.0.user_id, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Sale recorded", sale)),
    ))
}

/// Get a sale with its lines
pub async fn get_sale<S: InventoryStore>(
    State(state): State<AppState<S>>,
    _current_user: CurrentUser,
    sale_id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<ApiResponse<TransactionHeader>>> {
    let Path(sale_id) = sale_id?;
    let service = SaleService::new(state.store);
    let sale = service.get(sale_id).await?;
    Ok(Json(ApiResponse::success("Sale retrieved", sale)))
}

/// List sales, optionally filtered by `start_date` and `end_date`
pub async fn list_sales<S: InventoryStore>(
    State(state): State<AppState<S>>,
    _current_user: CurrentUser,
    query: Result<Query<DateRangeQuery>, QueryRejection>,
) -> AppResult<Json<ApiResponse<Vec<TransactionHeader>>>> {
    let Query(query) = query?;
    let service = SaleService::new(state.store);
    let sales = service.list(query.into_range()?).await?;
    Ok(Json(ApiResponse::success("Sales retrieved", sales)))
}
