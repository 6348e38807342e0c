// ============================================================================
// Services - the order lifecycle operations
// ============================================================================
//
// Each service is a thin orchestration layer over the domain: it resolves
// nothing about identity itself (the caller is an explicit parameter), maps
// domain errors into `OrderServiceError` and owns the side effects that sit
// between aggregates (inventory, cart, notifications, metrics).
//
// ============================================================================

pub mod cart;
pub mod checkout;
pub mod errors;
pub mod notifications;
pub mod order_status;
pub mod payment_confirmation;
pub mod shipping;

use std::sync::Arc;

use crate::domain::order::{OrderCommandHandler, OrderRepository};
use crate::metrics::Metrics;
use crate::storage::Backends;
use crate::utils::RetryConfig;

pub use cart::{CartItemView, CartService, CartView};
pub use checkout::CheckoutService;
pub use errors::OrderServiceError;
pub use notifications::{ActorNotificationSink, NotificationKind, NotificationSink, OrderNotification};
pub use order_status::OrderStatusService;
pub use payment_confirmation::PaymentConfirmationService;
pub use shipping::{FlatRateShipping, ShippingPolicy};

/// Every service, wired to one set of backends
pub struct OrderServices {
    pub carts: CartService,
    pub checkout: CheckoutService,
    pub status: OrderStatusService,
    pub payments: PaymentConfirmationService,
}

impl OrderServices {
    pub fn new(
        backends: &Backends,
        shipping: Arc<dyn ShippingPolicy>,
        notifications: Arc<dyn NotificationSink>,
        metrics: Arc<Metrics>,
        conflict_retry: RetryConfig,
    ) -> Self {
        let orders = Arc::new(OrderRepository::new(
            OrderCommandHandler::new(backends.events.clone(), conflict_retry),
            backends.projection.clone(),
        ));

        Self {
            carts: CartService::new(backends.carts.clone(), backends.catalog.clone()),
            checkout: CheckoutService::new(
                backends.carts.clone(),
                backends.catalog.clone(),
                backends.inventory.clone(),
                orders.clone(),
                shipping,
                notifications.clone(),
                metrics.clone(),
            ),
            status: OrderStatusService::new(
                orders.clone(),
                backends.inventory.clone(),
                notifications.clone(),
                metrics.clone(),
            ),
            payments: PaymentConfirmationService::new(orders, notifications, metrics),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::actors::InMemoryDeadLetterStore;
    use crate::domain::cart::{Cart, CartStore, InMemoryCartStore};
    use crate::domain::catalog::{InMemoryCatalog, ProductSnapshot};
    use crate::domain::inventory::{InMemoryInventoryLedger, InventoryLedger};
    use crate::domain::order::{DeliveryDetails, InMemoryOrderProjection, OrderAggregate, OrderEvent, PaymentMethod};
    use crate::event_sourcing::{EventEnvelope, EventStore, EventStoreError, InMemoryEventStore};
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::time::Duration;
    use uuid::Uuid;

    pub use super::notifications::testing::RecordingSink;

    /// In-memory services plus handles for seeding and inspecting state
    pub struct Harness {
        pub services: Arc<OrderServices>,
        pub sink: Arc<RecordingSink>,
        pub metrics: Arc<Metrics>,
        catalog: Arc<InMemoryCatalog>,
        inventory: Arc<InMemoryInventoryLedger>,
        carts: Arc<InMemoryCartStore>,
    }

    impl Harness {
        pub fn new() -> Self {
            Self::with_event_store(Arc::new(InMemoryEventStore::new()))
        }

        pub fn with_failing_event_store() -> Self {
            Self::with_event_store(Arc::new(FailingEventStore { delay: None }))
        }

        pub fn with_slow_event_store() -> Self {
            Self::with_event_store(Arc::new(FailingEventStore {
                delay: Some(Duration::from_millis(100)),
            }))
        }

        /// Working event store whose appends take `delay`
        pub fn with_delayed_event_store(delay: Duration) -> Self {
            Self::with_event_store(Arc::new(DelayedEventStore {
                inner: InMemoryEventStore::new(),
                delay,
            }))
        }

        fn with_event_store(events: Arc<dyn EventStore<OrderEvent>>) -> Self {
            let catalog = Arc::new(InMemoryCatalog::new());
            let inventory = Arc::new(InMemoryInventoryLedger::new());
            let carts = Arc::new(InMemoryCartStore::new());
            let sink = Arc::new(RecordingSink::default());
            let metrics = Arc::new(Metrics::new().unwrap());

            let backends = Backends {
                catalog: catalog.clone(),
                inventory: inventory.clone(),
                carts: carts.clone(),
                events,
                projection: Arc::new(InMemoryOrderProjection::new()),
                dead_letters: Arc::new(InMemoryDeadLetterStore::new()),
            };

            let services = Arc::new(OrderServices::new(
                &backends,
                Arc::new(FlatRateShipping::new(dec!(50), Some(dec!(1000)))),
                sink.clone(),
                metrics.clone(),
                RetryConfig {
                    max_attempts: 5,
                    initial_delay: Duration::from_millis(1),
                    max_delay: Duration::from_millis(10),
                    multiplier: 2.0,
                },
            ));

            Self {
                services,
                sink,
                metrics,
                catalog,
                inventory,
                carts,
            }
        }

        pub fn add_product(&self, name: &str, unit_price: Decimal, stock: u32) -> Uuid {
            let id = Uuid::new_v4();
            self.catalog
                .upsert(ProductSnapshot {
                    id,
                    name: name.to_string(),
                    unit_price,
                })
                .unwrap();
            self.inventory.set_stock(id, stock);
            id
        }

        pub fn reprice(&self, id: Uuid, unit_price: Decimal) {
            self.catalog
                .upsert(ProductSnapshot {
                    id,
                    name: "Repriced".to_string(),
                    unit_price,
                })
                .unwrap();
        }

        pub async fn stock(&self, id: Uuid) -> u32 {
            self.inventory.available(id).await.unwrap()
        }

        pub async fn cart(&self, owner_id: Uuid) -> Cart {
            self.carts.get(owner_id).await.unwrap()
        }

        pub async fn place_order(
            &self,
            owner_id: Uuid,
            product_id: Uuid,
            quantity: u32,
            payment_method: PaymentMethod,
        ) -> OrderAggregate {
            self.services.carts.add_item(owner_id, product_id, quantity).await.unwrap();
            self.services
                .checkout
                .checkout(owner_id, delivery(), payment_method)
                .await
                .unwrap()
        }
    }

    pub fn delivery() -> DeliveryDetails {
        DeliveryDetails {
            name: "Ada Lovelace".to_string(),
            phone: "+44 20 7946 0958".to_string(),
            address: "12 St James's Square, London".to_string(),
        }
    }

    /// Event store whose appends always fail, optionally after a delay
    struct FailingEventStore {
        delay: Option<Duration>,
    }

    #[async_trait]
    impl EventStore<OrderEvent> for FailingEventStore {
        async fn append_events(
            &self,
            _aggregate_id: Uuid,
            _expected_version: i64,
            _events: Vec<EventEnvelope<OrderEvent>>,
        ) -> Result<i64, EventStoreError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Err(EventStoreError::Backend(anyhow::anyhow!("event store unavailable")))
        }

        async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<EventEnvelope<OrderEvent>>, EventStoreError> {
            Ok(Vec::new())
        }

        async fn get_current_version(&self, _aggregate_id: Uuid) -> Result<i64, EventStoreError> {
            Ok(0)
        }
    }

    struct DelayedEventStore {
        inner: InMemoryEventStore<OrderEvent>,
        delay: Duration,
    }

    #[async_trait]
    impl EventStore<OrderEvent> for DelayedEventStore {
        async fn append_events(
            &self,
            aggregate_id: Uuid,
            expected_version: i64,
            events: Vec<EventEnvelope<OrderEvent>>,
        ) -> Result<i64, EventStoreError> {
            tokio::time::sleep(self.delay).await;
            self.inner.append_events(aggregate_id, expected_version, events).await
        }

        async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<EventEnvelope<OrderEvent>>, EventStoreError> {
            self.inner.load_events(aggregate_id).await
        }

        async fn get_current_version(&self, aggregate_id: Uuid) -> Result<i64, EventStoreError> {
            self.inner.get_current_version(aggregate_id).await
        }
    }
}
