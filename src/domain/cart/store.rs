use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

use super::model::{Cart, CartError, CartLine};

// ============================================================================
// Cart Store
// ============================================================================

#[async_trait]
pub trait CartStore: Send + Sync {
    /// Current cart; an owner without one gets an empty cart
    async fn get(&self, owner_id: Uuid) -> Result<Cart, CartError>;

    async fn add_item(&self, owner_id: Uuid, product_id: Uuid, quantity: u32) -> Result<Cart, CartError>;

    async fn update_quantity(&self, owner_id: Uuid, product_id: Uuid, quantity: u32) -> Result<Cart, CartError>;

    async fn remove_item(&self, owner_id: Uuid, product_id: Uuid) -> Result<Cart, CartError>;

    async fn clear(&self, owner_id: Uuid) -> Result<Cart, CartError>;

    /// Atomically subtract lines that were turned into an order
    async fn remove_ordered(&self, owner_id: Uuid, ordered: &[CartLine]) -> Result<Cart, CartError>;
}

/// Process-local store. Each mutation runs under the map lock, so updates to
/// one cart are serialized.
#[derive(Default)]
pub struct InMemoryCartStore {
    carts: Mutex<HashMap<Uuid, Cart>>,
}

impl InMemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn mutate<F>(&self, owner_id: Uuid, change: F) -> Result<Cart, CartError>
    where
        F: FnOnce(&mut Cart) -> Result<(), CartError>,
    {
        let mut carts = self.carts.lock().unwrap_or_else(PoisonError::into_inner);
        let mut cart = carts.get(&owner_id).cloned().unwrap_or_else(|| Cart::empty(owner_id));
        change(&mut cart)?;
        carts.insert(owner_id, cart.clone());
        Ok(cart)
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn get(&self, owner_id: Uuid) -> Result<Cart, CartError> {
        let carts = self.carts.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(carts.get(&owner_id).cloned().unwrap_or_else(|| Cart::empty(owner_id)))
    }

    async fn add_item(&self, owner_id: Uuid, product_id: Uuid, quantity: u32) -> Result<Cart, CartError> {
        self.mutate(owner_id, |cart| cart.add(product_id, quantity))
    }

    async fn update_quantity(&self, owner_id: Uuid, product_id: Uuid, quantity: u32) -> Result<Cart, CartError> {
        self.mutate(owner_id, |cart| cart.set_quantity(product_id, quantity))
    }

    async fn remove_item(&self, owner_id: Uuid, product_id: Uuid) -> Result<Cart, CartError> {
        self.mutate(owner_id, |cart| {
            cart.remove(product_id);
            Ok(())
        })
    }

    async fn clear(&self, owner_id: Uuid) -> Result<Cart, CartError> {
        self.mutate(owner_id, |cart| {
            cart.clear();
            Ok(())
        })
    }

    async fn remove_ordered(&self, owner_id: Uuid, ordered: &[CartLine]) -> Result<Cart, CartError> {
        self.mutate(owner_id, |cart| {
            cart.remove_ordered(ordered);
            Ok(())
        })
    }
}
