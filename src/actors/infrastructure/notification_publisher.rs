use kameo::Actor;
use kameo::actor::ActorRef;
use kameo::error::Infallible;
use kameo::message::{Context, Message};
use std::sync::Arc;

use crate::messaging::EventPublisher;
use crate::metrics::Metrics;
use crate::services::notifications::OrderNotification;
use crate::utils::{retry_with_backoff, RetryConfig};
use super::dlq::{AddToDlq, DlqActor};

// ============================================================================
// Notification Publisher Actor
// ============================================================================
//
// Serializes order notifications and publishes them to the broker, keyed by
// order id so every notification for one order lands on the same partition.
// Publishing is retried with backoff; whatever still fails goes to the DLQ.
//
// ============================================================================

pub struct PublishNotification(pub OrderNotification);

pub struct NotificationPublisher {
    publisher: Arc<dyn EventPublisher>,
    topic: String,
    retry: RetryConfig,
    dlq: ActorRef<DlqActor>,
    metrics: Arc<Metrics>,
}

impl NotificationPublisher {
    pub fn new(
        publisher: Arc<dyn EventPublisher>,
        topic: impl Into<String>,
        retry: RetryConfig,
        dlq: ActorRef<DlqActor>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            publisher,
            topic: topic.into(),
            retry,
            dlq,
            metrics,
        }
    }
}

impl Actor for NotificationPublisher {
    type Args = Self;
    type Error = Infallible;

    async fn on_start(state: Self::Args, _actor_ref: ActorRef<Self>) -> Result<Self, Self::Error> {
        tracing::info!(topic = %state.topic, "NotificationPublisher started");
        Ok(state)
    }
}

impl Message<PublishNotification> for NotificationPublisher {
    type Reply = ();

    async fn handle(&mut self, msg: PublishNotification, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        let notification = msg.0;
        let kind = notification.kind.as_str();

        let payload = match serde_json::to_string(&notification) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(order_id = %notification.order_id, error = %e, "Failed to serialize notification");
                self.metrics.record_notification("serialization_failed");
                return;
            }
        };
        let key = notification.order_id.to_string();

        let mut attempts = 0;
        let result = retry_with_backoff(self.retry.clone(), |attempt| {
            attempts = attempt;
            self.publisher.publish(&self.topic, &key, &payload)
        })
        .await
        .into_result();

        self.metrics
            .update_circuit_breaker_state(self.publisher.circuit_state().await.gauge_value());

        match result {
            Ok(()) => {
                tracing::debug!(order_id = %notification.order_id, kind = %kind, "Notification published");
                self.metrics.record_notification("published");
            }
            Err(e) => {
                self.metrics.record_notification("dead_lettered");

                // Fire and forget - use tell
                let _ = self
                    .dlq
                    .tell(AddToDlq {
                        order_id: notification.order_id,
                        kind: kind.to_string(),
                        payload,
                        error_message: e.to_string(),
                        failure_count: attempts,
                    })
                    .send()
                    .await;
            }
        }
    }
}
