// ============================================================================
// Storage - backend selection and wiring
// ============================================================================
//
// Every durable concern sits behind a trait object so the services run the
// same against the in-memory backend (tests, local runs) and ScyllaDB.
//
// ============================================================================

pub mod scylla;

use std::sync::Arc;

use crate::actors::{DeadLetterStore, InMemoryDeadLetterStore};
use crate::config::{SeedProduct, StorageBackend, StorageConfig};
use crate::domain::cart::{CartStore, InMemoryCartStore};
use crate::domain::catalog::{InMemoryCatalog, ProductCatalog, ProductSnapshot};
use crate::domain::inventory::{InMemoryInventoryLedger, InventoryLedger};
use crate::domain::order::{InMemoryOrderProjection, OrderEvent, OrderProjection};
use crate::event_sourcing::{EventStore, InMemoryEventStore, ScyllaEventStore};

pub struct Backends {
    pub catalog: Arc<dyn ProductCatalog>,
    pub inventory: Arc<dyn InventoryLedger>,
    pub carts: Arc<dyn CartStore>,
    pub events: Arc<dyn EventStore<OrderEvent>>,
    pub projection: Arc<dyn OrderProjection>,
    pub dead_letters: Arc<dyn DeadLetterStore>,
}

impl Backends {
    pub async fn from_config(config: &StorageConfig, seed: &[SeedProduct]) -> anyhow::Result<Self> {
        match config.backend {
            StorageBackend::Memory => Self::in_memory(seed),
            StorageBackend::Scylla => Self::scylla(&config.scylla_nodes, &config.keyspace, seed).await,
        }
    }

    pub fn in_memory(seed: &[SeedProduct]) -> anyhow::Result<Self> {
        let catalog = InMemoryCatalog::new();
        let inventory = InMemoryInventoryLedger::new();

        for product in seed {
            catalog.upsert(snapshot(product))?;
            inventory.set_stock(product.id, product.stock);
        }

        tracing::info!(products = seed.len(), "Using in-memory storage");

        Ok(Self {
            catalog: Arc::new(catalog),
            inventory: Arc::new(inventory),
            carts: Arc::new(InMemoryCartStore::new()),
            events: Arc::new(InMemoryEventStore::new()),
            projection: Arc::new(InMemoryOrderProjection::new()),
            dead_letters: Arc::new(InMemoryDeadLetterStore::new()),
        })
    }

    pub async fn scylla(nodes: &[String], keyspace: &str, seed: &[SeedProduct]) -> anyhow::Result<Self> {
        let session = scylla::connect(nodes, keyspace).await?;

        let catalog = scylla::ScyllaCatalog::new(session.clone());
        let inventory = scylla::ScyllaInventoryLedger::new(session.clone());

        // Existing stock counters are kept across restarts
        for product in seed {
            catalog.upsert(&snapshot(product)).await?;
            inventory.seed(product.id, product.stock).await?;
        }

        tracing::info!(products = seed.len(), "Using ScyllaDB storage");

        Ok(Self {
            catalog: Arc::new(catalog),
            inventory: Arc::new(inventory),
            carts: Arc::new(scylla::ScyllaCartStore::new(session.clone())),
            events: Arc::new(ScyllaEventStore::<OrderEvent>::new(session.clone(), "Order")),
            projection: Arc::new(scylla::ScyllaOrderProjection::new(session.clone())),
            dead_letters: Arc::new(scylla::ScyllaDeadLetterStore::new(session)),
        })
    }
}

fn snapshot(product: &SeedProduct) -> ProductSnapshot {
    ProductSnapshot {
        id: product.id,
        name: product.name.clone(),
        unit_price: product.unit_price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_in_memory_backends_are_seeded() {
        let id = Uuid::new_v4();
        let seed = vec![SeedProduct {
            id,
            name: "Walnut Desk".to_string(),
            unit_price: dec!(349.00),
            stock: 4,
        }];

        let backends = Backends::in_memory(&seed).unwrap();

        let product = backends.catalog.get_product(id).await.unwrap().unwrap();
        assert_eq!(product.name, "Walnut Desk");
        assert_eq!(product.unit_price, dec!(349.00));
        assert_eq!(backends.inventory.available(id).await.unwrap(), 4);
    }

    #[test]
    fn test_invalid_seed_is_rejected() {
        let seed = vec![SeedProduct {
            id: Uuid::new_v4(),
            name: "Free Lunch".to_string(),
            unit_price: dec!(0),
            stock: 1,
        }];

        assert!(Backends::in_memory(&seed).is_err());
    }
}
