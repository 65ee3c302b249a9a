//! Item master data and dashboard tests
//!
//! Tests for item maintenance including:
//! - Created items get a generated code and are immediately usable by purchases
//! - Items that moved stock cannot be deleted
//! - Dashboard totals follow committed stock and sales

mod common;

use common::{add_item, add_stocked_item, dec, line, request, store};
use rust_decimal::Decimal;
use shared::ItemRequest;
use uuid::Uuid;
use warehouse_backend::services::{DashboardService, ItemService, PurchaseService, SaleService};
use warehouse_backend::store::InventoryStore;
use warehouse_backend::AppError;

fn item_request(name: &str, purchase: &str, sale: &str) -> ItemRequest {
    ItemRequest {
        name: name.to_string(),
        unit: None,
        purchase_price: dec(purchase),
        sale_price: dec(sale),
    }
}

// ============================================================================
// Item Maintenance Tests
// ============================================================================

#[tokio::test]
async fn test_create_item_then_purchase_it() {
    let store = store();
    let service = ItemService::new(store.clone());

    let item = service
        .create(item_request("  Kopi Arabika ", "15000", "18000"))
        .await
        .unwrap();

    assert!(item.code.starts_with("ITM-"));
    assert_eq!(item.name, "Kopi Arabika");
    assert_eq!(item.unit, "pcs");
    assert_eq!(service.get(item.id).await.unwrap(), item);

    PurchaseService::new(store.clone())
        .create(Uuid::new_v4(), request(vec![line(item.id, 12, "15000")]))
        .await
        .unwrap();
    assert_eq!(store.current_quantity(item.id).await.unwrap(), 12);
}

#[tokio::test]
async fn test_invalid_item_requests_rejected() {
    let store = store();
    let service = ItemService::new(store.clone());

    let blank = service.create(item_request(" ", "1", "2")).await;
    assert!(matches!(blank, Err(AppError::Validation { ref field, .. }) if field == "name"));

    let sub_cent = service.create(item_request("Gula", "0.001", "2")).await;
    assert!(
        matches!(sub_cent, Err(AppError::Validation { ref field, .. }) if field == "purchase_price")
    );

    let free = service.create(item_request("Gula", "1", "0")).await;
    assert!(matches!(free, Err(AppError::Validation { ref field, .. }) if field == "sale_price"));

    assert!(service.list(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_keeps_code() {
    let store = store();
    let service = ItemService::new(store.clone());
    let item = service
        .create(item_request("Teh", "5000", "7000"))
        .await
        .unwrap();

    let mut changes = item_request("Teh Hijau", "5500", "7500");
    changes.unit = Some("box".to_string());
    let updated = service.update(item.id, changes.clone()).await.unwrap();

    assert_eq!(updated.code, item.code);
    assert_eq!(updated.name, "Teh Hijau");
    assert_eq!(updated.unit, "box");
    assert_eq!(updated.sale_price, dec("7500"));

    let missing = service.update(Uuid::new_v4(), changes).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_list_items_search() {
    let store = store();
    add_item(&store, "KOPI-1");
    add_item(&store, "TEH-1");
    let service = ItemService::new(store);

    assert_eq!(service.list(None).await.unwrap().len(), 2);
    let found = service.list(Some("kopi")).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].code, "KOPI-1");
    assert_eq!(service.list(Some("  ")).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_delete_only_unused_items() {
    let store = store();
    let unused = add_item(&store, "A");
    let stocked = add_item(&store, "B");
    PurchaseService::new(store.clone())
        .create(Uuid::new_v4(), request(vec![line(stocked, 1, "10")]))
        .await
        .unwrap();

    let service = ItemService::new(store.clone());
    service.delete(unused).await.unwrap();
    assert!(matches!(service.get(unused).await, Err(AppError::NotFound(_))));
    assert!(matches!(service.delete(unused).await, Err(AppError::NotFound(_))));

    assert!(matches!(service.delete(stocked).await, Err(AppError::Conflict(_))));
    assert!(service.get(stocked).await.is_ok());
}

// ============================================================================
// Dashboard Tests
// ============================================================================

#[tokio::test]
async fn test_dashboard_empty_store() {
    let stats = DashboardService::new(store()).stats().await.unwrap();

    assert_eq!(stats.total_items, 0);
    assert_eq!(stats.total_stock, 0);
    assert_eq!(stats.total_asset_value, Decimal::ZERO);
    assert!(stats.top_selling.is_empty());
}

#[tokio::test]
async fn test_dashboard_totals_and_top_selling() {
    let store = store();
    // Fixture items cost 10 each
    let a = add_stocked_item(&store, "A", 20);
    let b = add_stocked_item(&store, "B", 20);
    add_item(&store, "C");

    let sales = SaleService::new(store.clone());
    sales
        .create(Uuid::new_v4(), request(vec![line(a, 2, "15"), line(b, 5, "15")]))
        .await
        .unwrap();
    sales
        .create(Uuid::new_v4(), request(vec![line(a, 1, "15")]))
        .await
        .unwrap();

    let stats = DashboardService::new(store).stats().await.unwrap();

    assert_eq!(stats.total_items, 3);
    assert_eq!(stats.total_stock, 32);
    assert_eq!(stats.total_asset_value, dec("320"));
    assert_eq!(stats.top_selling.len(), 2);
    assert_eq!(stats.top_selling[0].item_id, b);
    assert_eq!(stats.top_selling[0].quantity_sold, 5);
    assert_eq!(stats.top_selling[1].code, "A");
    assert_eq!(stats.top_selling[1].quantity_sold, 3);
}

#[tokio::test]
async fn test_purchases_do_not_count_as_sales() {
    let store = store();
    let a = add_item(&store, "A");
    PurchaseService::new(store.clone())
        .create(Uuid::new_v4(), request(vec![line(a, 9, "10")]))
        .await
        .unwrap();

    let stats = DashboardService::new(store).stats().await.unwrap();
    assert_eq!(stats.total_stock, 9);
    assert!(stats.top_selling.is_empty());
}
