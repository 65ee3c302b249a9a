//! Route definitions for the Warehouse Stock Ledger

use axum::{middleware, routing::get, Router};
use std::sync::Arc;

use crate::store::InventoryStore;
use crate::{handlers, middleware::auth_middleware, AppState, Config};

/// Create API routes
pub fn api_routes<S: InventoryStore>(config: Arc<Config>) -> Router<AppState<S>> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check::<S>))
        // Protected routes - purchases (stock in)
        .nest("/purchases", purchase_routes::<S>(config.clone()))
        // Protected routes - sales (stock out)
        .nest("/sales", sale_routes::<S>(config.clone()))
        // Protected routes - stock levels and history
        .nest("/stock", stock_routes::<S>(config.clone()))
        // Protected routes - item master data
        .nest("/items", item_routes::<S>(config.clone()))
        // Protected routes - dashboard summary
        .nest("/dashboard", dashboard_routes::<S>(config))
}

/// Purchase routes (protected)
fn purchase_routes<S: InventoryStore>(config: Arc<Config>) -> Router<AppState<S>> {
    Router::new()
        .route(
            "/",
            get(handlers::list_purchases::<S>).post(handlers::create_purchase::<S>),
        )
        .route("/:purchase_id", get(handlers::get_purchase::<S>))
        .route_layer(middleware::from_fn_with_state(config, auth_middleware))
}

/// Sale routes (protected)
fn sale_routes<S: InventoryStore>(config: Arc<Config>) -> Router<AppState<S>> {
    Router::new()
        .route(
            "/",
            get(handlers::list_sales::<S>).post(handlers::create_sale::<S>),
        )
        .route("/:sale_id", get(handlers::get_sale::<S>))
        .route_layer(middleware::from_fn_with_state(config, auth_middleware))
}

/// Stock routes (protected)
fn stock_routes<S: InventoryStore>(config: Arc<Config>) -> Router<AppState<S>> {
    Router::new()
        .route("/", get(handlers::list_stock::<S>))
        .route("/history", get(handlers::list_stock_history::<S>))
        .route("/:item_id", get(handlers::get_stock::<S>))
        .route("/:item_id/history", get(handlers::get_item_history::<S>))
        .route_layer(middleware::from_fn_with_state(config, auth_middleware))
}

/// Item routes (protected)
fn item_routes<S: InventoryStore>(config: Arc<Config>) -> Router<AppState<S>> {
    Router::new()
        .route(
            "/",
            get(handlers::list_items::<S>).post(handlers::create_item::<S>),
        )
        .route(
            "/:item_id",
            get(handlers::get_item::<S>)
                .put(handlers::update_item::<S>)
                .delete(handlers::delete_item::<S>),
        )
        .route_layer(middleware::from_fn_with_state(config, auth_middleware))
}

/// Dashboard routes (protected)
fn dashboard_routes<S: InventoryStore>(config: Arc<Config>) -> Router<AppState<S>> {
    Router::new()
        .route("/", get(handlers::get_dashboard::<S>))
        .route_layer(middleware::from_fn_with_state(config, auth_middleware))
}
