use chrono::{DateTime, Utc};
use kameo::actor::ActorRef;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::actors::{NotificationPublisher, PublishNotification};
use crate::domain::order::{OrderAggregate, OrderStatus};

// ============================================================================
// Notification Sink
// ============================================================================
//
// Order creation and status changes are handed to the sink after they have
// been persisted. Delivery is asynchronous and best-effort: `notify` never
// blocks the caller and cannot fail the operation that triggered it.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    OrderCreated,
    StatusChanged,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::OrderCreated => "order_created",
            NotificationKind::StatusChanged => "status_changed",
        }
    }
}

/// Payload delivered to the outside world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderNotification {
    pub kind: NotificationKind,
    pub order_id: Uuid,
    pub owner_id: Uuid,
    pub status: OrderStatus,
    pub previous_status: Option<OrderStatus>,
    pub timestamp: DateTime<Utc>,
}

impl OrderNotification {
    pub fn created(order: &OrderAggregate) -> Self {
        Self {
            kind: NotificationKind::OrderCreated,
            order_id: order.id,
            owner_id: order.owner_id,
            status: order.status,
            previous_status: None,
            timestamp: order.created_at,
        }
    }

    pub fn status_changed(order: &OrderAggregate, previous_status: OrderStatus) -> Self {
        Self {
            kind: NotificationKind::StatusChanged,
            order_id: order.id,
            owner_id: order.owner_id,
            status: order.status,
            previous_status: Some(previous_status),
            timestamp: order.updated_at,
        }
    }
}

pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: OrderNotification);
}

/// Forwards notifications to the publisher actor
pub struct ActorNotificationSink {
    publisher: ActorRef<NotificationPublisher>,
}

impl ActorNotificationSink {
    pub fn new(publisher: ActorRef<NotificationPublisher>) -> Self {
        Self { publisher }
    }
}

impl NotificationSink for ActorNotificationSink {
    fn notify(&self, notification: OrderNotification) {
        let publisher = self.publisher.clone();
        let order_id = notification.order_id;

        tokio::spawn(async move {
            if let Err(e) = publisher.tell(PublishNotification(notification)).send().await {
                tracing::warn!(order_id = %order_id, error = %e, "Notification dropped, publisher unavailable");
            }
        });
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::{Mutex, PoisonError};

    /// Keeps every notification in memory for assertions
    #[derive(Default)]
    pub struct RecordingSink {
        received: Mutex<Vec<OrderNotification>>,
    }

    impl RecordingSink {
        pub fn received(&self) -> Vec<OrderNotification> {
            self.received.lock().unwrap_or_else(PoisonError::into_inner).clone()
        }
    }

    impl NotificationSink for RecordingSink {
        fn notify(&self, notification: OrderNotification) {
            self.received.lock().unwrap_or_else(PoisonError::into_inner).push(notification);
        }
    }
}
