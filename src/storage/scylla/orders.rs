use async_trait::async_trait;
use futures_util::TryStreamExt;
use scylla::client::session::Session;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::order::{sort_newest_first, OrderAggregate, OrderProjection, OrderStatus};

// ============================================================================
// Scylla Order Projection
// ============================================================================
//
// `order_views` keeps the latest state of every order as JSON. Writes carry
// the aggregate version as their write timestamp, so a late write of an older
// version never overwrites a newer one. Owner lists go through a secondary
// index; the admin list pages through the table.
//
// ============================================================================

pub struct ScyllaOrderProjection {
    session: Arc<Session>,
}

impl ScyllaOrderProjection {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

fn decode(bodies: Vec<String>) -> anyhow::Result<Vec<OrderAggregate>> {
    bodies
        .iter()
        .map(|body| serde_json::from_str::<OrderAggregate>(body).map_err(anyhow::Error::from))
        .collect()
}

#[async_trait]
impl OrderProjection for ScyllaOrderProjection {
    async fn upsert(&self, order: &OrderAggregate) -> anyhow::Result<()> {
        let body = serde_json::to_string(order)?;

        self.session
            .query_unpaged(
                "INSERT INTO order_views (order_id, owner_id, status, created_at, version, body)
                 VALUES (?, ?, ?, ?, ?, ?) USING TIMESTAMP ?",
                (
                    order.id,
                    order.owner_id,
                    order.status.as_str(),
                    order.created_at,
                    order.version,
                    body,
                    order.version,
                ),
            )
            .await?;

        tracing::debug!(order_id = %order.id, version = order.version, "Order projection updated");
        Ok(())
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> anyhow::Result<Vec<OrderAggregate>> {
        let bodies: Vec<String> = self
            .session
            .query_iter("SELECT body FROM order_views WHERE owner_id = ?", (owner_id,))
            .await?
            .rows_stream::<(String,)>()?
            .map_ok(|(body,)| body)
            .try_collect()
            .await?;

        let mut orders = decode(bodies)?;
        sort_newest_first(&mut orders);
        Ok(orders)
    }

    async fn list_all(&self, status: Option<OrderStatus>) -> anyhow::Result<Vec<OrderAggregate>> {
        let rows: Vec<(String, String)> = self
            .session
            .query_iter("SELECT status, body FROM order_views", &[])
            .await?
            .rows_stream::<(String, String)>()?
            .try_collect()
            .await?;

        let bodies = rows
            .into_iter()
            .filter(|(row_status, _)| status.map_or(true, |wanted| wanted.as_str() == row_status.as_str()))
            .map(|(_, body)| body)
            .collect();

        let mut orders = decode(bodies)?;
        sort_newest_first(&mut orders);
        Ok(orders)
    }
}
