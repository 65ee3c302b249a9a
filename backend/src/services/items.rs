//! Item master data service

use shared::{validate_item_request, Item, ItemRequest};
use uuid::Uuid;

use super::document_number::DocumentNumberGenerator;
use super::orchestrator::MAX_DOCUMENT_ATTEMPTS;
use crate::error::{AppError, AppResult};
use crate::store::InventoryStore;

/// Item service
#[derive(Clone)]
pub struct ItemService<S> {
    store: S,
    codes: DocumentNumberGenerator,
}

impl<S: InventoryStore> ItemService<S> {
    /// Create a new ItemService instance
    pub fn new(store: S) -> Self {
        Self {
            store,
            codes: DocumentNumberGenerator::new(),
        }
    }

    /// List items, optionally filtered by code or name
    pub async fn list(&self, search: Option<&str>) -> AppResult<Vec<Item>> {
        self.store.list_items(search).await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Item> {
        self.store
            .get_item(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Item".to_string()))
    }

    /// Create an item with a generated `ITM-YYMMDD-XXXX` code
    pub async fn create(&self, request: ItemRequest) -> AppResult<Item> {
        validate_item_request(&request)?;

        let mut attempt = 1;
        loop {
            let item = Item {
                id: Uuid::new_v4(),
                code: self.codes.generate_item_code(),
                name: request.name.trim().to_string(),
                unit: request.unit_or_default(),
                purchase_price: request.purchase_price,
                sale_price: request.sale_price,
            };

            match self.store.create_item(&item).await {
                Ok(()) => {
                    tracing::info!(item_id = %item.id, code = %item.code, "Item created");
                    return Ok(item);
                }
                Err(AppError::Conflict(_)) if attempt < MAX_DOCUMENT_ATTEMPTS => {
                    tracing::warn!(
                        code = %item.code,
                        attempt,
                        "Generated item code collided, retrying"
                    );
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Update name, unit and prices; the code never changes
    pub async fn update(&self, id: Uuid, request: ItemRequest) -> AppResult<Item> {
        validate_item_request(&request)?;

        let item = Item {
            id,
            code: String::new(),
            name: request.name.trim().to_string(),
            unit: request.unit_or_default(),
            purchase_price: request.purchase_price,
            sale_price: request.sale_price,
        };

        self.store
            .update_item(&item)
            .await?
            .ok_or_else(|| AppError::NotFound("Item".to_string()))
    }

    /// Delete an item that never moved stock
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        if !self.store.delete_item(id).await? {
            return Err(AppError::NotFound("Item".to_string()));
        }
        tracing::info!(item_id = %id, "Item deleted");
        Ok(())
    }
}
