use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

// ============================================================================
// Inventory Ledger
// ============================================================================
//
// Owns the available quantity per product. `reserve` and `release` are
// atomic read-modify-writes on a single product counter; the counter never
// goes below zero. The ledger knows nothing about carts or orders.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: Uuid,
        requested: u32,
        available: u32,
    },

    #[error("Unknown product: {0}")]
    UnknownProduct(Uuid),

    #[error("Quantity must be positive")]
    InvalidQuantity,

    #[error("Stock counter overflow for product {0}")]
    CounterOverflow(Uuid),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

#[async_trait]
pub trait InventoryLedger: Send + Sync {
    /// Take `quantity` units if that many are available; returns the new count
    async fn reserve(&self, product_id: Uuid, quantity: u32) -> Result<u32, InventoryError>;

    /// Put `quantity` units back; returns the new count
    async fn release(&self, product_id: Uuid, quantity: u32) -> Result<u32, InventoryError>;

    async fn available(&self, product_id: Uuid) -> Result<u32, InventoryError>;
}

/// Process-local ledger. The map lock only guards the set of products; each
/// counter is updated with a compare-and-swap loop so different products never
/// contend with each other.
#[derive(Default)]
pub struct InMemoryInventoryLedger {
    counters: RwLock<HashMap<Uuid, Arc<AtomicU32>>>,
}

impl InMemoryInventoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stock(stock: impl IntoIterator<Item = (Uuid, u32)>) -> Self {
        let ledger = Self::new();
        for (product_id, quantity) in stock {
            ledger.set_stock(product_id, quantity);
        }
        ledger
    }

    /// Restock or register a product
    pub fn set_stock(&self, product_id: Uuid, quantity: u32) {
        let mut counters = self.counters.write().unwrap_or_else(PoisonError::into_inner);
        counters
            .entry(product_id)
            .or_insert_with(|| Arc::new(AtomicU32::new(0)))
            .store(quantity, Ordering::SeqCst);
    }

    fn counter(&self, product_id: Uuid) -> Result<Arc<AtomicU32>, InventoryError> {
        let counters = self.counters.read().unwrap_or_else(PoisonError::into_inner);
        counters
            .get(&product_id)
            .cloned()
            .ok_or(InventoryError::UnknownProduct(product_id))
    }
}

#[async_trait]
impl InventoryLedger for InMemoryInventoryLedger {
    async fn reserve(&self, product_id: Uuid, quantity: u32) -> Result<u32, InventoryError> {
        if quantity == 0 {
            return Err(InventoryError::InvalidQuantity);
        }

        let counter = self.counter(product_id)?;
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |available| available.checked_sub(quantity))
            .map(|previous| previous - quantity)
            .map_err(|available| InventoryError::InsufficientStock {
                product_id,
                requested: quantity,
                available,
            })
    }

    async fn release(&self, product_id: Uuid, quantity: u32) -> Result<u32, InventoryError> {
        if quantity == 0 {
            return Err(InventoryError::InvalidQuantity);
        }

        let counter = self.counter(product_id)?;
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |available| available.checked_add(quantity))
            .map(|previous| previous + quantity)
            .map_err(|_| InventoryError::CounterOverflow(product_id))
    }

    async fn available(&self, product_id: Uuid) -> Result<u32, InventoryError> {
        Ok(self.counter(product_id)?.load(Ordering::SeqCst))
    }
}
