use async_trait::async_trait;
use rust_decimal::Decimal;
use scylla::client::session::Session;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::catalog::{ProductCatalog, ProductSnapshot};

/// Read accessor over the `products` table. Prices are stored as decimal text
/// so they round-trip without loss.
pub struct ScyllaCatalog {
    session: Arc<Session>,
}

impl ScyllaCatalog {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    pub async fn upsert(&self, product: &ProductSnapshot) -> anyhow::Result<()> {
        product.validate()?;

        self.session
            .query_unpaged(
                "INSERT INTO products (product_id, name, unit_price) VALUES (?, ?, ?)",
                (product.id, &product.name, product.unit_price.to_string()),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ProductCatalog for ScyllaCatalog {
    async fn get_product(&self, product_id: Uuid) -> anyhow::Result<Option<ProductSnapshot>> {
        let result = self
            .session
            .query_unpaged(
                "SELECT product_id, name, unit_price FROM products WHERE product_id = ?",
                (product_id,),
            )
            .await?;

        let row = result
            .into_rows_result()?
            .maybe_first_row::<(Uuid, String, String)>()?;

        row.map(|(id, name, unit_price)| -> anyhow::Result<ProductSnapshot> {
            Ok(ProductSnapshot {
                id,
                name,
                unit_price: Decimal::from_str(&unit_price)?,
            })
        })
        .transpose()
    }
}
