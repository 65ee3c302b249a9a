//! HTTP handlers for item master data

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shared::{ApiResponse, Item, ItemRequest};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::ItemService;
use crate::store::InventoryStore;
use crate::AppState;

/// Query parameters for item listings
#[derive(Debug, Default, Deserialize)]
pub struct ItemSearchQuery {
    /// Case-insensitive match on code or name
    pub search: Option<String>,
}

/// List items
pub async fn list_items<S: InventoryStore>(
    State(state): State<AppState<S>>,
    _current_user: CurrentUser,
    query: Result<Query<ItemSearchQuery>, QueryRejection>,
) -> AppResult<Json<ApiResponse<Vec<Item>>>> {
    let Query(query) = query?;
    let service = ItemService::new(state.store);
    let items = service.list(query.search.as_deref()).await?;
    Ok(Json(ApiResponse::success("Items retrieved", items)))
}

pub async fn get_item<S: InventoryStore>(
    State(state): State<AppState<S>>,
    _current_user: CurrentUser,
    item_id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<ApiResponse<Item>>> {
    let Path(item_id) = item_id?;
    let service = ItemService::new(state.store);
    let item = service.get(item_id).await?;
    Ok(Json(ApiResponse::success("Item retrieved", item)))
}

/// Create an item; the code is generated
pub async fn create_item<S: InventoryStore>(
    State(state): State<AppState<S>>,
    _current_user: CurrentUser,
    payload: Result<Json<ItemRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<Item>>)> {
    let Json(request) = payload?;
    let service = ItemService::new(state.store);
    let item = service.create(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Item created", item)),
    ))
}

pub async fn update_item<S: InventoryStore>(
    State(state): State<AppState<S>>,
    _current_user: CurrentUser,
    item_id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ItemRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<Item>>> {
    let Path(item_id) = item_id?;
    let Json(request) = payload?;
    let service = ItemService::new(state.store);
    let item = service.update(item_id, request).await?;
    Ok(Json(ApiResponse::success("Item updated", item)))
}

/// Delete an item with no stock records. Responds with the deleted id.
pub async fn delete_item<S: InventoryStore>(
    State(state): State<AppState<S>>,
    _current_user: CurrentUser,
    item_id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<ApiResponse<Uuid>>> {
    let Path(item_id) = item_id?;
    let service = ItemService::new(state.store);
    service.delete(item_id).await?;
    Ok(Json(ApiResponse::success("Item deleted", item_id)))
}
