use std::sync::Arc;
use uuid::Uuid;

use super::ledger::{InventoryError, InventoryLedger};

// ============================================================================
// Reservation - scoped hold on inventory
// ============================================================================
//
// Collects the units taken during one checkout. Unless `commit` is called,
// every held unit goes back to the ledger: explicitly via `release_all`, or
// from `Drop` when the owning future is cancelled or unwinds before it gets
// that far.
//
// ============================================================================

pub struct Reservation {
    ledger: Arc<dyn InventoryLedger>,
    held: Vec<(Uuid, u32)>,
}

impl Reservation {
    pub fn new(ledger: Arc<dyn InventoryLedger>) -> Self {
        Self { ledger, held: Vec::new() }
    }

    /// Reserve through the ledger and remember the hold
    pub async fn reserve(&mut self, product_id: Uuid, quantity: u32) -> Result<u32, InventoryError> {
        let remaining = self.ledger.reserve(product_id, quantity).await?;
        self.held.push((product_id, quantity));

        tracing::debug!(
            product_id = %product_id,
            quantity = quantity,
            remaining = remaining,
            "Reserved stock"
        );

        Ok(remaining)
    }

    pub fn held(&self) -> &[(Uuid, u32)] {
        &self.held
    }

    /// The holds now belong to a persisted order
    pub fn commit(mut self) {
        self.held.clear();
    }

    /// Give every held unit back, newest hold first
    pub async fn release_all(mut self) {
        let held = std::mem::take(&mut self.held);
        release_holds(self.ledger.clone(), held).await;
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        if self.held.is_empty() {
            return;
        }

        let held = std::mem::take(&mut self.held);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::warn!(holds = held.len(), "Reservation dropped mid-flight, releasing stock");
                handle.spawn(release_holds(self.ledger.clone(), held));
            }
            Err(_) => {
                tracing::error!(holds = ?held, "Reservation dropped outside a runtime, stock not released");
            }
        }
    }
}

async fn release_holds(ledger: Arc<dyn InventoryLedger>, held: Vec<(Uuid, u32)>) {
    for (product_id, quantity) in held.into_iter().rev() {
        match ledger.release(product_id, quantity).await {
            Ok(available) => tracing::debug!(
                product_id = %product_id,
                quantity = quantity,
                available = available,
                "Released stock"
            ),
            Err(e) => tracing::error!(
                product_id = %product_id,
                quantity = quantity,
                error = %e,
                "Failed to release reserved stock"
            ),
        }
    }
}
