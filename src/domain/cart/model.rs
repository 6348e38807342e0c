use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Cart Model
// ============================================================================
//
// One mutable cart per user, at most one line per product. Carts are created
// lazily and only ever emptied, never deleted. `version` counts mutations and
// backs compare-and-swap writes in durable stores.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: Uuid,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub owner_id: Uuid,
    pub lines: Vec<CartLine>,
    pub version: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum CartError {
    #[error("Quantity must be positive")]
    InvalidQuantity,

    #[error("Product {0} is not in the cart")]
    LineNotFound(Uuid),

    #[error("Unknown product: {0}")]
    UnknownProduct(Uuid),

    #[error("Quantity overflow for product {0}")]
    QuantityOverflow(Uuid),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl Cart {
    pub fn empty(owner_id: Uuid) -> Self {
        Self {
            owner_id,
            lines: Vec::new(),
            version: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn quantity_of(&self, product_id: Uuid) -> Option<u32> {
        self.lines
            .iter()
            .find(|line| line.product_id == product_id)
            .map(|line| line.quantity)
    }

    /// Add to an existing line or append a new one
    pub fn add(&mut self, product_id: Uuid, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        match self.lines.iter_mut().find(|line| line.product_id == product_id) {
            Some(line) => {
                line.quantity = line
                    .quantity
                    .checked_add(quantity)
                    .ok_or(CartError::QuantityOverflow(product_id))?;
            }
            None => self.lines.push(CartLine { product_id, quantity }),
        }

        self.version += 1;
        Ok(())
    }

    pub fn set_quantity(&mut self, product_id: Uuid, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        let line = self
            .lines
            .iter_mut()
            .find(|line| line.product_id == product_id)
            .ok_or(CartError::LineNotFound(product_id))?;

        line.quantity = quantity;
        self.version += 1;
        Ok(())
    }

    /// Removing a product that is not in the cart leaves it unchanged
    pub fn remove(&mut self, product_id: Uuid) {
        let before = self.lines.len();
        self.lines.retain(|line| line.product_id != product_id);
        if self.lines.len() != before {
            self.version += 1;
        }
    }

    pub fn clear(&mut self) {
        if !self.lines.is_empty() {
            self.lines.clear();
            self.version += 1;
        }
    }

    /// Take the ordered quantities out of the cart. Anything added after the
    /// order was taken stays; lines that drop to zero are removed.
    pub fn remove_ordered(&mut self, ordered: &[CartLine]) {
        let mut changed = false;
        for taken in ordered {
            if let Some(line) = self.lines.iter_mut().find(|line| line.product_id == taken.product_id) {
                line.quantity = line.quantity.saturating_sub(taken.quantity);
                changed = true;
            }
        }

        if changed {
            self.lines.retain(|line| line.quantity > 0);
            self.version += 1;
        }
    }
}
