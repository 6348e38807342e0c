use async_trait::async_trait;
use scylla::client::session::Session;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::inventory::{InventoryError, InventoryLedger};
use super::{lwt_applied, MAX_CAS_ATTEMPTS};

/// Inventory counters in the `inventory` table, updated with
/// `UPDATE ... IF available = ?` so every change is a compare-and-swap.
pub struct ScyllaInventoryLedger {
    session: Arc<Session>,
}

impl ScyllaInventoryLedger {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    /// Seed stock for a product unless it already has a counter
    pub async fn seed(&self, product_id: Uuid, available: u32) -> anyhow::Result<()> {
        self.session
            .query_unpaged(
                "INSERT INTO inventory (product_id, available) VALUES (?, ?) IF NOT EXISTS",
                (product_id, i64::from(available)),
            )
            .await?;
        Ok(())
    }

    async fn read(&self, product_id: Uuid) -> Result<u32, InventoryError> {
        let result = self
            .session
            .query_unpaged("SELECT available FROM inventory WHERE product_id = ?", (product_id,))
            .await
            .map_err(anyhow::Error::from)?;

        let row = result
            .into_rows_result()
            .map_err(anyhow::Error::from)?
            .maybe_first_row::<(Option<i64>,)>()
            .map_err(anyhow::Error::from)?;

        match row {
            Some((Some(available),)) => u32::try_from(available)
                .map_err(|_| InventoryError::Backend(anyhow::anyhow!("corrupt counter {} for {}", available, product_id))),
            _ => Err(InventoryError::UnknownProduct(product_id)),
        }
    }

    /// Compare-and-swap loop; `change` maps the current count to the new one
    async fn update<F>(&self, product_id: Uuid, change: F) -> Result<u32, InventoryError>
    where
        F: Fn(u32) -> Result<u32, InventoryError> + Send + Sync,
    {
        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let current = self.read(product_id).await?;
            let next = change(current)?;

            let result = self
                .session
                .query_unpaged(
                    "UPDATE inventory SET available = ? WHERE product_id = ? IF available = ?",
                    (i64::from(next), product_id, i64::from(current)),
                )
                .await
                .map_err(anyhow::Error::from)?;

            if lwt_applied(result)? {
                return Ok(next);
            }

            tracing::debug!(product_id = %product_id, attempt = attempt, "Inventory CAS lost, retrying");
        }

        Err(InventoryError::Backend(anyhow::anyhow!(
            "inventory counter for {} too contended after {} attempts",
            product_id,
            MAX_CAS_ATTEMPTS
        )))
    }
}

#[async_trait]
impl InventoryLedger for ScyllaInventoryLedger {
    async fn reserve(&self, product_id: Uuid, quantity: u32) -> Result<u32, InventoryError> {
        if quantity == 0 {
            return Err(InventoryError::InvalidQuantity);
        }

        self.update(product_id, |available| {
            available
                .checked_sub(quantity)
                .ok_or(InventoryError::InsufficientStock {
                    product_id,
                    requested: quantity,
                    available,
                })
        })
        .await
    }

    async fn release(&self, product_id: Uuid, quantity: u32) -> Result<u32, InventoryError> {
        if quantity == 0 {
            return Err(InventoryError::InvalidQuantity);
        }

        self.update(product_id, |available| {
            available
                .checked_add(quantity)
                .ok_or(InventoryError::CounterOverflow(product_id))
        })
        .await
    }

    async fn available(&self, product_id: Uuid) -> Result<u32, InventoryError> {
        self.read(product_id).await
    }
}
