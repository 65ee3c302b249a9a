//! HTTP handler for the dashboard summary

use axum::{extract::State, Json};
use shared::{ApiResponse, DashboardStats};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::DashboardService;
use crate::store::InventoryStore;
use crate::AppState;

pub async fn get_dashboard<S: InventoryStore>(
    State(state): State<AppState<S>>,
    _current_user: CurrentUser,
) -> AppResult<Json<ApiResponse<DashboardStats>>> {
    let service = DashboardService::new(state.store);
    let stats = service.stats().await?;
    Ok(Json(ApiResponse::success("Dashboard retrieved", stats)))
}
