use std::sync::Arc;
use uuid::Uuid;

use crate::event_sourcing::core::{Aggregate, EventEnvelope};
use crate::event_sourcing::store::{load_aggregate, EventStore, EventStoreError};
use crate::utils::{retry_on_transient, IsTransient, RetryConfig};

use super::aggregate::OrderAggregate;
use super::commands::OrderCommand;
use super::errors::OrderError;
use super::events::OrderEvent;

// ============================================================================
// Order Command Handler
// ============================================================================
//
// Orchestrates: Command → Aggregate → Events → Event Store
//
// Every write is an optimistic append at the version the aggregate was loaded
// at. A concurrent writer makes the append fail with a version conflict; the
// handler then reloads and re-decides, so a status change is always evaluated
// against the latest state of the order.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderCommandError {
    #[error("Order not found: {0}")]
    NotFound(Uuid),

    #[error(transparent)]
    Rejected(#[from] OrderError),

    #[error(transparent)]
    Store(#[from] EventStoreError),
}

impl IsTransient for OrderCommandError {
    fn is_transient(&self) -> bool {
        matches!(self, OrderCommandError::Store(e) if e.is_transient())
    }
}

/// Aggregate state after the command together with the events it produced.
/// `applied` is empty when the command was already satisfied.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub order: OrderAggregate,
    pub applied: Vec<OrderEvent>,
}

pub struct OrderCommandHandler {
    event_store: Arc<dyn EventStore<OrderEvent>>,
    retry: RetryConfig,
}

impl OrderCommandHandler {
    pub fn new(event_store: Arc<dyn EventStore<OrderEvent>>, retry: RetryConfig) -> Self {
        Self { event_store, retry }
    }

    pub fn event_store(&self) -> &Arc<dyn EventStore<OrderEvent>> {
        &self.event_store
    }

    /// Start a new order stream
    pub async fn create(
        &self,
        order_id: Uuid,
        command: OrderCommand,
        correlation_id: Uuid,
    ) -> Result<CommandOutcome, OrderCommandError> {
        let events = OrderAggregate::handle_creation(&command)?;
        let envelopes = wrap(order_id, &command, &events, correlation_id);

        let version = self
            .event_store
            .append_events(order_id, 0, envelopes)
            .await
            .map_err(|e| match e {
                EventStoreError::Conflict { .. } => OrderCommandError::Rejected(OrderError::AlreadyExists),
                other => OrderCommandError::Store(other),
            })?;

        let mut events_iter = events.iter();
        let first = events_iter.next().ok_or(OrderError::NotInitialized)?;
        let mut order = OrderAggregate::apply_first_event(order_id, first)?;
        for event in events_iter {
            order.apply_event(event)?;
        }
        order.set_version(version);

        tracing::info!(
            order_id = %order_id,
            owner_id = %order.owner_id,
            status = %order.status,
            total = %order.total,
            "Order stream created"
        );

        Ok(CommandOutcome { order, applied: events })
    }

    /// Handle a command against an existing order, retrying on version conflicts
    pub async fn execute(
        &self,
        order_id: Uuid,
        command: OrderCommand,
        correlation_id: Uuid,
    ) -> Result<CommandOutcome, OrderCommandError> {
        retry_on_transient(self.retry.clone(), |attempt| {
            self.try_execute(order_id, &command, correlation_id, attempt)
        })
        .await
        .into_result()
    }

    async fn try_execute(
        &self,
        order_id: Uuid,
        command: &OrderCommand,
        correlation_id: Uuid,
        attempt: u32,
    ) -> Result<CommandOutcome, OrderCommandError> {
        let mut order = load_aggregate::<OrderAggregate, _>(self.event_store.as_ref(), order_id)
            .await?
            .ok_or(OrderCommandError::NotFound(order_id))?;

        let expected_version = order.version();
        let events = order.handle_command(command)?;

        if events.is_empty() {
            tracing::debug!(
                order_id = %order_id,
                status = %order.status,
                "Command already satisfied, nothing to append"
            );
            return Ok(CommandOutcome { order, applied: events });
        }

        let envelopes = wrap(order_id, command, &events, correlation_id);
        let new_version = self
            .event_store
            .append_events(order_id, expected_version, envelopes)
            .await
            .inspect_err(|e| {
                if e.is_transient() {
                    tracing::warn!(order_id = %order_id, attempt = attempt, error = %e, "Order append lost a race");
                }
            })?;

        for event in &events {
            order.apply_event(event)?;
        }
        order.set_version(new_version);

        Ok(CommandOutcome { order, applied: events })
    }
}

fn wrap(
    order_id: Uuid,
    command: &OrderCommand,
    events: &[OrderEvent],
    correlation_id: Uuid,
) -> Vec<EventEnvelope<OrderEvent>> {
    events
        .iter()
        .map(|event| {
            // Sequence numbers are assigned by the store
            let envelope = EventEnvelope::new(order_id, 0, event.clone(), correlation_id);
            match command.issuer() {
                Some(caller) => envelope
                    .with_user(caller.user_id)
                    .with_metadata("role", caller.role.as_str()),
                None => envelope,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::identity::Caller;
    use crate::domain::order::{DeliveryDetails, OrderLine, OrderStatus, PaymentMethod};
    use crate::event_sourcing::store::InMemoryEventStore;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn handler() -> OrderCommandHandler {
        let store: Arc<dyn EventStore<OrderEvent>> = Arc::new(InMemoryEventStore::new());
        let retry = RetryConfig {
            max_attempts: 5,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            multiplier: 2.0,
        };
        OrderCommandHandler::new(store, retry)
    }

    fn place_command(owner_id: Uuid) -> OrderCommand {
        OrderCommand::PlaceOrder {
            owner_id,
            lines: vec![OrderLine {
                product_id: Uuid::new_v4(),
                name: "Lamp".to_string(),
                unit_price: dec!(40),
                quantity: 1,
            }],
            delivery: DeliveryDetails {
                name: "Lin".to_string(),
                phone: "5550001111".to_string(),
                address: "7 Quiet Ln".to_string(),
            },
            shipping_charge: dec!(0),
            payment_method: PaymentMethod::CashOnDelivery,
        }
    }

    #[tokio::test]
    async fn test_create_then_execute() {
        let handler = handler();
        let owner = Uuid::new_v4();
        let order_id = Uuid::now_v7();

        let created = handler.create(order_id, place_command(owner), Uuid::new_v4()).await.unwrap();
        assert_eq!(created.order.version, 1);

        let outcome = handler
            .execute(order_id, OrderCommand::cancel(Caller::customer(owner), None), Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(outcome.applied.len(), 1);
        assert_eq!(outcome.order.status, OrderStatus::Cancelled);
        assert_eq!(outcome.order.version, 2);

        let stored = handler.event_store().load_events(order_id).await.unwrap();
        assert_eq!(stored[1].user_id, Some(owner));
        assert_eq!(stored[1].metadata.get("role").map(String::as_str), Some("customer"));
    }

    #[tokio::test]
    async fn test_create_twice_is_rejected() {
        let handler = handler();
        let order_id = Uuid::now_v7();
        let owner = Uuid::new_v4();

        handler.create(order_id, place_command(owner), Uuid::new_v4()).await.unwrap();
        let err = handler.create(order_id, place_command(owner), Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, OrderCommandError::Rejected(OrderError::AlreadyExists)));
    }

    #[tokio::test]
    async fn test_execute_unknown_order() {
        let handler = handler();
        let missing = Uuid::new_v4();
        let err = handler
            .execute(missing, OrderCommand::cancel(Caller::administrator(Uuid::new_v4()), None), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, OrderCommandError::NotFound(id) if id == missing));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_cancels_append_once() {
        let handler = Arc::new(handler());
        let owner = Uuid::new_v4();
        let order_id = Uuid::now_v7();
        handler.create(order_id, place_command(owner), Uuid::new_v4()).await.unwrap();

        let mut tasks = Vec::new();
        for i in 0..8 {
            let handler = handler.clone();
            let caller = if i % 2 == 0 { Caller::customer(owner) } else { Caller::administrator(Uuid::new_v4()) };
            tasks.push(tokio::spawn(async move {
                handler.execute(order_id, OrderCommand::cancel(caller, None), Uuid::new_v4()).await
            }));
        }

        let mut appended = 0;
        for task in tasks {
            let outcome = task.await.unwrap().unwrap();
            assert_eq!(outcome.order.status, OrderStatus::Cancelled);
            appended += outcome.applied.len();
        }

        assert_eq!(appended, 1);
        assert_eq!(handler.event_store().get_current_version(order_id).await.unwrap(), 2);
    }
}
