//! Sale flow tests
//!
//! Tests for recording sales including:
//! - Property 3: Stock never goes negative through a committed sale
//! - Property 4: A failing line rolls back the whole sale

mod common;

use common::{add_item, add_stocked_item, dec, line, request, store, ScriptedNumbers};
use shared::{MovementKind, TransactionKind};
use std::sync::Arc;
use uuid::Uuid;
use warehouse_backend::services::{PurchaseService, SaleService, StockLedger};
use warehouse_backend::store::InventoryStore;
use warehouse_backend::AppError;

// ============================================================================
// Scenario Tests
// ============================================================================

#[tokio::test]
async fn test_sell_then_oversell() {
    let store = store();
    let item = add_stocked_item(&store, "A", 10);
    let service = SaleService::new(store.clone());

    let sale = service
        .create(Uuid::new_v4(), request(vec![line(item, 4, "15")]))
        .await
        .unwrap();

    assert_eq!(sale.kind, TransactionKind::Sale);
    assert_eq!(sale.total, dec("60"));
    assert!(sale.document_number.starts_with("SAL-"));
    assert_eq!(store.current_quantity(item).await.unwrap(), 6);

    let history = store.list_history(Some(item)).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].kind, MovementKind::Out);
    assert_eq!(history[0].quantity, 4);
    assert_eq!(history[0].quantity_before, 10);
    assert_eq!(history[0].quantity_after, 6);
    assert_eq!(history[0].note, format!("Sale {}", sale.document_number));

    let err = service
        .create(Uuid::new_v4(), request(vec![line(item, 10, "15")]))
        .await
        .unwrap_err();

    match err {
        AppError::InsufficientStock {
            item_id,
            available,
            requested,
        } => {
            assert_eq!(item_id, item);
            assert_eq!(available, 6);
            assert_eq!(requested, 10);
        }
        other => panic!("expected InsufficientStock, got {:?}", other),
    }

    assert_eq!(store.current_quantity(item).await.unwrap(), 6);
    assert_eq!(store.list_history(Some(item)).await.unwrap().len(), 1);
    assert_eq!(
        store
            .list_transactions(TransactionKind::Sale, None)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_sell_exact_stock_to_zero() {
    let store = store();
    let item = add_stocked_item(&store, "A", 5);

    SaleService::new(store.clone())
        .create(Uuid::new_v4(), request(vec![line(item, 5, "1")]))
        .await
        .unwrap();

    assert_eq!(store.current_quantity(item).await.unwrap(), 0);
}

#[tokio::test]
async fn test_sale_of_never_stocked_item() {
    let store = store();
    let item = add_item(&store, "A");

    let err = SaleService::new(store.clone())
        .create(Uuid::new_v4(), request(vec![line(item, 1, "1")]))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InsufficientStock { available: 0, .. }));
    let level = StockLedger::new(store.clone()).level(item).await.unwrap();
    assert_eq!(level.quantity_on_hand, 0);
    assert!(level.updated_at.is_none());
}

// ============================================================================
// Atomicity Tests
// ============================================================================

#[tokio::test]
async fn test_failing_line_rolls_back_earlier_lines() {
    let store = store();
    let plenty = add_stocked_item(&store, "A", 100);
    let scarce = add_stocked_item(&store, "B", 1);

    let err = SaleService::new(store.clone())
        .create(
            Uuid::new_v4(),
            request(vec![line(plenty, 10, "2"), line(scarce, 2, "3")]),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InsufficientStock { .. }));
    assert_eq!(store.current_quantity(plenty).await.unwrap(), 100);
    assert_eq!(store.current_quantity(scarce).await.unwrap(), 1);
    assert!(store.list_history(None).await.unwrap().is_empty());
    assert!(store
        .list_transactions(TransactionKind::Sale, None)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_same_item_lines_checked_cumulatively() {
    let store = store();
    let item = add_stocked_item(&store, "A", 5);

    // 3 + 3 exceeds 5 even though each line alone fits
    let err = SaleService::new(store.clone())
        .create(
            Uuid::new_v4(),
            request(vec![line(item, 3, "1"), line(item, 3, "1")]),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AppError::InsufficientStock {
            available: 2,
            requested: 3,
            ..
        }
    ));
    assert_eq!(store.current_quantity(item).await.unwrap(), 5);
}

#[tokio::test]
async fn test_duplicate_document_rolls_back_stock() {
    let store = store();
    let item = add_stocked_item(&store, "A", 10);
    let service = SaleService::new(store.clone());

    let mut req = request(vec![line(item, 2, "5")]);
    req.document_number = Some("INV-77".to_string());
    service.create(Uuid::new_v4(), req.clone()).await.unwrap();

    let err = service.create(Uuid::new_v4(), req).await.unwrap_err();

    assert!(matches!(err, AppError::DuplicateDocument(_)));
    assert_eq!(store.current_quantity(item).await.unwrap(), 8);
    assert_eq!(store.list_history(Some(item)).await.unwrap().len(), 1);
}

// ============================================================================
// Ledger Interaction Tests
// ============================================================================

#[tokio::test]
async fn test_purchase_then_sale_history_chain() {
    let store = store();
    let item = add_item(&store, "A");
    let user = Uuid::new_v4();

    PurchaseService::new(store.clone())
        .create(user, request(vec![line(item, 20, "8")]))
        .await
        .unwrap();
    SaleService::new(store.clone())
        .create(user, request(vec![line(item, 7, "12")]))
        .await
        .unwrap();

    let ledger = StockLedger::new(store.clone());
    let history = ledger.history(Some(item)).await.unwrap();

    // Newest first
    assert_eq!(history[0].kind, MovementKind::Out);
    assert_eq!((history[0].quantity_before, history[0].quantity_after), (20, 13));
    assert_eq!(history[1].kind, MovementKind::In);
    assert_eq!((history[1].quantity_before, history[1].quantity_after), (0, 20));

    let sum: i64 = history.iter().map(|h| h.signed_quantity()).sum();
    assert_eq!(sum, ledger.current_quantity(item).await.unwrap());
}

// ============================================================================
// Document Number Collision Tests
// ============================================================================

#[tokio::test]
async fn test_generated_number_collision_is_retried() {
    let store = store();
    let item = add_stocked_item(&store, "A", 10);

    let mut taken = request(vec![line(item, 1, "15")]);
    taken.document_number = Some("SAL-TAKEN".to_string());
    SaleService::new(store.clone())
        .create(Uuid::new_v4(), taken)
        .await
        .unwrap();

    let numbers = Arc::new(ScriptedNumbers::new(&["SAL-TAKEN", "SAL-FRESH"]));
    let service = SaleService::with_numbers(store.clone(), numbers.clone());
    let sale = service
        .create(Uuid::new_v4(), request(vec![line(item, 2, "15")]))
        .await
        .unwrap();

    assert_eq!(sale.document_number, "SAL-FRESH");
    assert_eq!(numbers.calls(), 2);

    // The collided attempt left nothing behind
    assert_eq!(store.current_quantity(item).await.unwrap(), 7);
    let history = store.list_history(Some(item)).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].note, "Sale SAL-FRESH");
    assert_eq!(history[0].quantity_before, 9);
    assert_eq!(history[0].quantity_after, 7);
    assert_eq!(
        store
            .list_transactions(TransactionKind::Sale, None)
            .await
            .unwrap()
            .len(),
        2
    );
}

#[tokio::test]
async fn test_persistent_collision_gives_up_after_three_attempts() {
    let store = store();
    let item = add_stocked_item(&store, "A", 10);

    let mut taken = request(vec![line(item, 1, "15")]);
    taken.document_number = Some("SAL-TAKEN".to_string());
    SaleService::new(store.clone())
        .create(Uuid::new_v4(), taken)
        .await
        .unwrap();

    let numbers = Arc::new(ScriptedNumbers::new(&["SAL-TAKEN"]));
    let err = SaleService::with_numbers(store.clone(), numbers.clone())
        .create(Uuid::new_v4(), request(vec![line(item, 2, "15")]))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::DuplicateDocument(ref n) if n == "SAL-TAKEN"));
    assert_eq!(
        numbers.calls(),
        warehouse_backend::services::orchestrator::MAX_DOCUMENT_ATTEMPTS as usize
    );
    assert_eq!(store.current_quantity(item).await.unwrap(), 9);
    assert_eq!(store.list_history(Some(item)).await.unwrap().len(), 1);
}
