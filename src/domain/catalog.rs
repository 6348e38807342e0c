use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use uuid::Uuid;

// ============================================================================
// Product Catalog (read accessor)
// ============================================================================
//
// Catalog CRUD lives in another subsystem. Orders only need the current name
// and unit price of a product; stock is owned by the inventory ledger.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub id: Uuid,
    pub name: String,
    pub unit_price: Decimal,
}

#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn get_product(&self, product_id: Uuid) -> anyhow::Result<Option<ProductSnapshot>>;
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Unit price must be positive for product {0}")]
    NonPositivePrice(Uuid),

    #[error("Product name cannot be empty")]
    EmptyName,
}

impl ProductSnapshot {
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::EmptyName);
        }
        if self.unit_price <= Decimal::ZERO {
            return Err(CatalogError::NonPositivePrice(self.id));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryCatalog {
    products: RwLock<HashMap<Uuid, ProductSnapshot>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a product (used for seeding and price changes)
    pub fn upsert(&self, product: ProductSnapshot) -> Result<(), CatalogError> {
        product.validate()?;
        let mut products = self.products.write().unwrap_or_else(PoisonError::into_inner);
        products.insert(product.id, product);
        Ok(())
    }
}

#[async_trait]
impl ProductCatalog for InMemoryCatalog {
    async fn get_product(&self, product_id: Uuid) -> anyhow::Result<Option<ProductSnapshot>> {
        let products = self.products.read().unwrap_or_else(PoisonError::into_inner);
        Ok(products.get(&product_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_upsert_and_read() {
        let catalog = InMemoryCatalog::new();
        let id = Uuid::new_v4();

        catalog
            .upsert(ProductSnapshot { id, name: "Teapot".to_string(), unit_price: dec!(25) })
            .unwrap();
        catalog
            .upsert(ProductSnapshot { id, name: "Teapot".to_string(), unit_price: dec!(30) })
            .unwrap();

        let product = catalog.get_product(id).await.unwrap().unwrap();
        assert_eq!(product.unit_price, dec!(30));
        assert!(catalog.get_product(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[test]
    fn test_non_positive_price_rejected() {
        let catalog = InMemoryCatalog::new();
        let result = catalog.upsert(ProductSnapshot {
            id: Uuid::new_v4(),
            name: "Freebie".to_string(),
            unit_price: dec!(0),
        });
        assert!(matches!(result, Err(CatalogError::NonPositivePrice(_))));
    }
}
