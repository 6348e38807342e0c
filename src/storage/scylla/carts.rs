use async_trait::async_trait;
use scylla::client::session::Session;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::cart::{Cart, CartError, CartLine, CartStore};
use super::{lwt_applied, MAX_CAS_ATTEMPTS};

// ============================================================================
// Scylla Cart Store
// ============================================================================
//
// One row per owner: the lines as JSON plus a version. Every mutation is a
// read-modify-write guarded by `IF version = ?` (or `IF NOT EXISTS` for the
// first write), so concurrent edits of one cart never lose an update.
//
// ============================================================================

pub struct ScyllaCartStore {
    session: Arc<Session>,
}

impl ScyllaCartStore {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    async fn load(&self, owner_id: Uuid) -> Result<Cart, CartError> {
        let result = self
            .session
            .query_unpaged("SELECT lines, version FROM carts WHERE owner_id = ?", (owner_id,))
            .await
            .map_err(anyhow::Error::from)?;

        let row = result
            .into_rows_result()
            .map_err(anyhow::Error::from)?
            .maybe_first_row::<(String, i64)>()
            .map_err(anyhow::Error::from)?;

        match row {
            Some((lines, version)) => {
                let lines: Vec<CartLine> = serde_json::from_str(&lines).map_err(anyhow::Error::from)?;
                Ok(Cart { owner_id, lines, version })
            }
            None => Ok(Cart::empty(owner_id)),
        }
    }

    async fn mutate<F>(&self, owner_id: Uuid, change: F) -> Result<Cart, CartError>
    where
        F: Fn(&mut Cart) -> Result<(), CartError> + Send + Sync,
    {
        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let mut cart = self.load(owner_id).await?;
            let loaded_version = cart.version;
            change(&mut cart)?;

            if cart.version == loaded_version {
                return Ok(cart);
            }

            let lines = serde_json::to_string(&cart.lines).map_err(anyhow::Error::from)?;
            let result = if loaded_version == 0 {
                self.session
                    .query_unpaged(
                        "INSERT INTO carts (owner_id, lines, version) VALUES (?, ?, ?) IF NOT EXISTS",
                        (owner_id, lines, cart.version),
                    )
                    .await
            } else {
                self.session
                    .query_unpaged(
                        "UPDATE carts SET lines = ?, version = ? WHERE owner_id = ? IF version = ?",
                        (lines, cart.version, owner_id, loaded_version),
                    )
                    .await
            }
            .map_err(anyhow::Error::from)?;

            if lwt_applied(result)? {
                return Ok(cart);
            }

            tracing::debug!(owner_id = %owner_id, attempt = attempt, "Cart CAS lost, retrying");
        }

        Err(CartError::Backend(anyhow::anyhow!(
            "cart of {} too contended after {} attempts",
            owner_id,
            MAX_CAS_ATTEMPTS
        )))
    }
}

#[async_trait]
impl CartStore for ScyllaCartStore {
    async fn get(&self, owner_id: Uuid) -> Result<Cart, CartError> {
        self.load(owner_id).await
    }

    async fn add_item(&self, owner_id: Uuid, product_id: Uuid, quantity: u32) -> Result<Cart, CartError> {
        self.mutate(owner_id, |cart| cart.add(product_id, quantity)).await
    }

    async fn update_quantity(&self, owner_id: Uuid, product_id: Uuid, quantity: u32) -> Result<Cart, CartError> {
        self.mutate(owner_id, |cart| cart.set_quantity(product_id, quantity)).await
    }

    async fn remove_item(&self, owner_id: Uuid, product_id: Uuid) -> Result<Cart, CartError> {
        self.mutate(owner_id, |cart| {
            cart.remove(product_id);
            Ok(())
        })
        .await
    }

    async fn clear(&self, owner_id: Uuid) -> Result<Cart, CartError> {
        self.mutate(owner_id, |cart| {
            cart.clear();
            Ok(())
        })
        .await
    }

    async fn remove_ordered(&self, owner_id: Uuid, ordered: &[CartLine]) -> Result<Cart, CartError> {
        self.mutate(owner_id, |cart| {
            cart.remove_ordered(ordered);
            Ok(())
        })
        .await
    }
}
