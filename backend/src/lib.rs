//! Warehouse Stock Ledger - Backend
//!
//! Records purchases and sales of stock items, keeps per-item on-hand
//! quantities with an append-only movement history, and guarantees that every
//! transaction commits as a whole or not at all.

use axum::{middleware as axum_middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod store;

pub use config::Config;
pub use error::{AppError, AppResult};

use middleware::{rate_limit_middleware, RateLimiter};
use store::{InventoryStore, PgStore};

/// Application state shared across handlers
pub struct AppState<S = PgStore> {
    pub store: S,
    pub config: Arc<Config>,
}

impl<S: Clone> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S: InventoryStore> AppState<S> {
    pub fn new(store: S, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}

/// Create the application router with all routes and middleware
///
/// Requires the service to be made with connect info
/// (`into_make_service_with_connect_info::<SocketAddr>`) for rate limiting.
pub fn create_app<S: InventoryStore>(state: AppState<S>, rate_limiter: Arc<RateLimiter>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check::<S>))
        .nest("/api/v1", routes::api_routes::<S>(state.config.clone()))
        .layer(axum_middleware::from_fn_with_state(
            rate_limiter,
            rate_limit_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Warehouse Stock Ledger API v1.0"
}
