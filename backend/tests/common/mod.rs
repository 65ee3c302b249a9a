//! Shared fixtures for the integration tests

#![allow(dead_code)]

use rust_decimal::Decimal;
use shared::{CreateTransactionRequest, Item, TransactionKind, TransactionLineInput};
use std::collections::VecDeque;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;
use warehouse_backend::services::DocumentNumberSource;
use warehouse_backend::store::MemoryStore;

// Helper to create Decimal from string
pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

pub fn store() -> MemoryStore {
    MemoryStore::new(Duration::from_secs(2))
}

/// Register an item and return its id
pub fn add_item(store: &MemoryStore, code: &str) -> Uuid {
    let item = Item {
        id: Uuid::new_v4(),
        code: code.to_string(),
        name: format!("Item {}", code),
        unit: "pcs".to_string(),
        purchase_price: dec("10"),
        sale_price: dec("15"),
    };
    let id = item.id;
    store.insert_item(item).unwrap();
    id
}

/// Register an item with an opening quantity
pub fn add_stocked_item(store: &MemoryStore, code: &str, quantity: i64) -> Uuid {
    let id = add_item(store, code);
    store.set_quantity(id, quantity).unwrap();
    id
}

pub fn line(item_id: Uuid, quantity: i64, unit_price: &str) -> TransactionLineInput {
    TransactionLineInput {
        item_id,
        quantity,
        unit_price: dec(unit_price),
    }
}

pub fn request(lines: Vec<TransactionLineInput>) -> CreateTransactionRequest {
    CreateTransactionRequest {
        document_number: None,
        counterparty: "Acme Trading".to_string(),
        lines,
    }
}

/// Hands out a fixed sequence of document numbers, repeating the last one
/// once the sequence runs out
pub struct ScriptedNumbers {
    queue: Mutex<VecDeque<String>>,
    last: Mutex<String>,
    calls: AtomicUsize,
}

impl ScriptedNumbers {
    pub fn new(numbers: &[&str]) -> Self {
        Self {
            queue: Mutex::new(numbers.iter().map(|n| n.to_string()).collect()),
            last: Mutex::new(numbers.last().unwrap_or(&"SCRIPTED").to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DocumentNumberSource for ScriptedNumbers {
    fn next_number(&self, _kind: TransactionKind) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.queue.lock().unwrap().pop_front() {
            Some(number) => number,
            None => self.last.lock().unwrap().clone(),
        }
    }
}
