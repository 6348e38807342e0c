use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

use crate::event_sourcing::store::{load_aggregate, EventStoreError};
use crate::utils::{retry_with_backoff, RetryConfig, RetryResult};

use super::aggregate::OrderAggregate;
use super::command_handler::{CommandOutcome, OrderCommandError, OrderCommandHandler};
use super::commands::OrderCommand;
use super::value_objects::OrderStatus;

// ============================================================================
// Order Repository
// ============================================================================
//
// The event stream is the record of truth for every order. Single-order reads
// replay it; list reads come from a projection that is refreshed after every
// successful append.
//
// ============================================================================

/// Read model used by the list operations
#[async_trait]
pub trait OrderProjection: Send + Sync {
    /// Store the latest state; an older version never overwrites a newer one
    async fn upsert(&self, order: &OrderAggregate) -> anyhow::Result<()>;

    /// Orders of one owner, newest first
    async fn list_by_owner(&self, owner_id: Uuid) -> anyhow::Result<Vec<OrderAggregate>>;

    /// All orders, optionally filtered by status, newest first
    async fn list_all(&self, status: Option<OrderStatus>) -> anyhow::Result<Vec<OrderAggregate>>;
}

pub struct OrderRepository {
    handler: OrderCommandHandler,
    projection: Arc<dyn OrderProjection>,
}

impl OrderRepository {
    pub fn new(handler: OrderCommandHandler, projection: Arc<dyn OrderProjection>) -> Self {
        Self { handler, projection }
    }

    pub async fn create(
        &self,
        order_id: Uuid,
        command: OrderCommand,
        correlation_id: Uuid,
    ) -> Result<OrderAggregate, OrderCommandError> {
        let outcome = self.handler.create(order_id, command, correlation_id).await?;
        self.project(&outcome.order).await;
        Ok(outcome.order)
    }

    pub async fn execute(
        &self,
        order_id: Uuid,
        command: OrderCommand,
        correlation_id: Uuid,
    ) -> Result<CommandOutcome, OrderCommandError> {
        let outcome = self.handler.execute(order_id, command, correlation_id).await?;
        if !outcome.applied.is_empty() {
            self.project(&outcome.order).await;
        }
        Ok(outcome)
    }

    pub async fn get(&self, order_id: Uuid) -> Result<Option<OrderAggregate>, EventStoreError> {
        load_aggregate(self.handler.event_store().as_ref(), order_id).await
    }

    pub async fn list_by_owner(&self, owner_id: Uuid) -> anyhow::Result<Vec<OrderAggregate>> {
        self.projection.list_by_owner(owner_id).await
    }

    pub async fn list_all(&self, status: Option<OrderStatus>) -> anyhow::Result<Vec<OrderAggregate>> {
        self.projection.list_all(status).await
    }

    // The append already succeeded, so a projection failure only leaves the
    // list views stale and is not reported to the caller.
    async fn project(&self, order: &OrderAggregate) {
        let result = retry_with_backoff(RetryConfig::conservative(), |_attempt| self.projection.upsert(order)).await;

        if let RetryResult::Failed(e) | RetryResult::PermanentFailure(e) = result {
            tracing::error!(
                order_id = %order.id,
                version = order.version,
                error = %e,
                "Failed to refresh order projection"
            );
        }
    }
}

// ============================================================================
// In-Memory Projection
// ============================================================================

#[derive(Default)]
pub struct InMemoryOrderProjection {
    orders: Mutex<HashMap<Uuid, OrderAggregate>>,
}

impl InMemoryOrderProjection {
    pub fn new() -> Self {
        Self::default()
    }

    fn collect<F>(&self, filter: F) -> Vec<OrderAggregate>
    where
        F: Fn(&OrderAggregate) -> bool,
    {
        let orders = self.orders.lock().unwrap_or_else(PoisonError::into_inner);
        let mut matching: Vec<OrderAggregate> = orders.values().filter(|o| filter(o)).cloned().collect();
        sort_newest_first(&mut matching);
        matching
    }
}

#[async_trait]
impl OrderProjection for InMemoryOrderProjection {
    async fn upsert(&self, order: &OrderAggregate) -> anyhow::Result<()> {
        let mut orders = self.orders.lock().unwrap_or_else(PoisonError::into_inner);
        match orders.get(&order.id) {
            Some(existing) if existing.version >= order.version => {}
            _ => {
                orders.insert(order.id, order.clone());
            }
        }
        Ok(())
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> anyhow::Result<Vec<OrderAggregate>> {
        Ok(self.collect(|o| o.owner_id == owner_id))
    }

    async fn list_all(&self, status: Option<OrderStatus>) -> anyhow::Result<Vec<OrderAggregate>> {
        Ok(self.collect(|o| status.map_or(true, |s| o.status == s)))
    }
}

/// Newest first; order ids are v7 so they break timestamp ties chronologically
pub fn sort_newest_first(orders: &mut [OrderAggregate]) {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
}
