//! HTTP API tests
//!
//! Drives the full router against the in-memory store: authentication,
//! the response envelope, status mapping and per-client rate limiting.

mod common;

use axum::{
    body::Body,
    extract::connect_info::MockConnectInfo,
    http::{header, Method, Request, StatusCode},
    Router,
};
use common::{add_item, add_stocked_item};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;
use warehouse_backend::config::{
    Config, DatabaseConfig, JwtConfig, LedgerConfig, RateLimitConfig, ServerConfig,
};
use warehouse_backend::middleware::RateLimiter;
use warehouse_backend::store::MemoryStore;
use warehouse_backend::{create_app, AppState};

const SECRET: &str = "test-secret";

fn test_config(burst: u32) -> Config {
    Config {
        environment: "test".to_string(),
        server: ServerConfig::default(),
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        jwt: JwtConfig {
            secret: SECRET.to_string(),
        },
        ledger: LedgerConfig::default(),
        rate_limit: RateLimitConfig {
            requests_per_second: 1.0,
            burst,
            idle_eviction_secs: 600,
        },
    }
}

fn app_with(store: MemoryStore, burst: u32) -> Router {
    let config = test_config(burst);
    let limiter = Arc::new(RateLimiter::new(&config.rate_limit));
    create_app(AppState::new(store, config), limiter)
        .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))))
}

fn app(store: MemoryStore) -> Router {
    app_with(store, 1000)
}

fn token(user_id: Uuid) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = json!({
        "sub": user_id.to_string(),
        "role": "staff",
        "iat": now,
        "exp": now + 3600,
    });
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token(Uuid::new_v4())));
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_missing_token_rejected() {
    let response = app(common::store())
        .oneshot(
            Request::builder()
                .uri("/api/v1/stock")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_is_public() {
    let response = app(common::store())
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["database"], "connected");
}

// ============================================================================
// Purchases and Sales
// ============================================================================

#[tokio::test]
async fn test_create_purchase_returns_created_envelope() {
    let store = common::store();
    let a = add_item(&store, "A");
    let b = add_item(&store, "B");

    let (status, body) = send(
        app(store.clone()),
        Method::POST,
        "/api/v1/purchases",
        Some(json!({
            "counterparty": "Supplier Co",
            "lines": [
                {"item_id": a, "quantity": 3, "unit_price": "100"},
                {"item_id": b, "quantity": 2, "unit_price": "50"}
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["kind"], "purchase");
    assert_eq!(body["data"]["total"], "400");
    assert_eq!(body["data"]["lines"].as_array().unwrap().len(), 2);

    let id = body["data"]["id"].as_str().unwrap().to_string();
    let (status, body) = send(
        app(store),
        Method::GET,
        &format!("/api/v1/purchases/{}", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["counterparty"], "Supplier Co");
}

#[tokio::test]
async fn test_insufficient_stock_is_unprocessable() {
    let store = common::store();
    let item = add_stocked_item(&store, "A", 6);

    let (status, body) = send(
        app(store),
        Method::POST,
        "/api/v1/sales",
        Some(json!({
            "counterparty": "Customer",
            "lines": [{"item_id": item, "quantity": 10, "unit_price": "5"}]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "INSUFFICIENT_STOCK");
    assert_eq!(body["data"]["available"], 6);
    assert_eq!(body["data"]["requested"], 10);
}

#[tokio::test]
async fn test_validation_and_lookup_errors() {
    let store = common::store();
    let item = add_item(&store, "A");

    let (status, body) = send(
        app(store.clone()),
        Method::POST,
        "/api/v1/purchases",
        Some(json!({"lines": []})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _) = send(
        app(store.clone()),
        Method::POST,
        "/api/v1/purchases",
        Some(json!({"lines": "not-a-list"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        app(store.clone()),
        Method::POST,
        "/api/v1/sales",
        Some(json!({"lines": [{"item_id": Uuid::new_v4(), "quantity": 1, "unit_price": "1"}]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        app(store.clone()),
        Method::GET,
        &format!("/api/v1/sales/{}", Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        app(store.clone()),
        Method::GET,
        "/api/v1/sales?start_date=2024-01-01",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(app(store.clone()), Method::GET, "/api/v1/stock/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(app(store), Method::GET, &format!("/api/v1/stock/{}", item), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["quantity_on_hand"], 0);
}

#[tokio::test]
async fn test_duplicate_document_number_conflicts() {
    let store = common::store();
    let item = add_stocked_item(&store, "A", 10);
    let body = json!({
        "document_number": "INV-1",
        "counterparty": "Customer",
        "lines": [{"item_id": item, "quantity": 1, "unit_price": "5"}]
    });

    let (status, _) = send(app(store.clone()), Method::POST, "/api/v1/sales", Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, response) = send(app(store), Method::POST, "/api/v1/sales", Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(response["success"], false);
}

#[tokio::test]
async fn test_stock_history_endpoints() {
    let store = common::store();
    let item = add_item(&store, "A");

    send(
        app(store.clone()),
        Method::POST,
        "/api/v1/purchases",
        Some(json!({"lines": [{"item_id": item, "quantity": 5, "unit_price": "2"}]})),
    )
    .await;

    let (status, body) = send(
        app(store.clone()),
        Method::GET,
        &format!("/api/v1/stock/{}/history", item),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["kind"], "in");
    assert_eq!(body["data"][0]["quantity_after"], 5);

    let (status, body) = send(app(store.clone()), Method::GET, "/api/v1/stock/history", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = send(app(store), Method::GET, "/api/v1/stock", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["quantity_on_hand"], 5);
}

#[tokio::test]
async fn test_oversized_line_is_bad_request() {
    let store = common::store();
    let item = add_item(&store, "A");

    let (status, body) = send(
        app(store.clone()),
        Method::POST,
        "/api/v1/purchases",
        Some(json!({
            "lines": [{"item_id": item, "quantity": i64::MAX, "unit_price": "79228162514264337593543950335"}]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = send(
        app(store),
        Method::POST,
        "/api/v1/purchases",
        Some(json!({"lines": [{"item_id": item, "quantity": 1, "unit_price": "0.001"}]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "lines[0].unit_price");
}

// ============================================================================
// Items and Dashboard
// ============================================================================

#[tokio::test]
async fn test_item_lifecycle_over_http() {
    let store = common::store();

    let (status, body) = send(
        app(store.clone()),
        Method::POST,
        "/api/v1/items",
        Some(json!({"name": "Kopi Robusta", "purchase_price": "12000", "sale_price": "15000"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["unit"], "pcs");
    let id = body["data"]["id"].as_str().unwrap().to_string();
    let code = body["data"]["code"].as_str().unwrap().to_string();

    let (status, body) = send(
        app(store.clone()),
        Method::PUT,
        &format!("/api/v1/items/{}", id),
        Some(json!({"name": "Kopi Robusta 250g", "unit": "pack", "purchase_price": "12500", "sale_price": "15500"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["code"], code.as_str());
    assert_eq!(body["data"]["unit"], "pack");

    let (status, body) = send(app(store.clone()), Method::GET, "/api/v1/items?search=robusta", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = send(
        app(store.clone()),
        Method::POST,
        "/api/v1/purchases",
        Some(json!({"lines": [{"item_id": id, "quantity": 4, "unit_price": "12500"}]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(app(store.clone()), Method::DELETE, &format!("/api/v1/items/{}", id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, body) = send(app(store), Method::GET, "/api/v1/dashboard", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_items"], 1);
    assert_eq!(body["data"]["total_stock"], 4);
    assert_eq!(body["data"]["total_asset_value"], "50000");
    assert_eq!(body["data"]["top_selling"], json!([]));
}

#[tokio::test]
async fn test_invalid_item_is_bad_request() {
    let (status, body) = send(
        app(common::store()),
        Method::POST,
        "/api/v1/items",
        Some(json!({"name": "", "purchase_price": "1", "sale_price": "1"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "name");
}

// ============================================================================
// Rate Limiting
// ============================================================================

#[tokio::test]
async fn test_rate_limit_exceeded() {
    let app = app_with(common::store(), 2);

    let mut statuses = Vec::new();
    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        statuses.push(response.status());
    }

    assert_eq!(
        statuses,
        vec![StatusCode::OK, StatusCode::OK, StatusCode::TOO_MANY_REQUESTS]
    );

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "1");
}
