use std::sync::Arc;
use uuid::Uuid;

use crate::domain::identity::Caller;
use crate::domain::order::{OrderAggregate, OrderCommand, OrderRepository, OrderStatus, PaymentProof};
use crate::metrics::Metrics;
use super::errors::OrderServiceError;
use super::notifications::{NotificationSink, OrderNotification};

/// Accepts proof of an out-of-band payment for a prepaid order and hands the
/// order over to manual review by moving it to `Processing`.
pub struct PaymentConfirmationService {
    orders: Arc<OrderRepository>,
    notifications: Arc<dyn NotificationSink>,
    metrics: Arc<Metrics>,
}

impl PaymentConfirmationService {
    pub fn new(orders: Arc<OrderRepository>, notifications: Arc<dyn NotificationSink>, metrics: Arc<Metrics>) -> Self {
        Self {
            orders,
            notifications,
            metrics,
        }
    }

    pub async fn submit_payment_proof(
        &self,
        order_id: Uuid,
        caller: Caller,
        artifact_ref: String,
        external_transaction_ref: Option<String>,
    ) -> Result<OrderAggregate, OrderServiceError> {
        let proof = PaymentProof {
            artifact_ref: artifact_ref.trim().to_string(),
            external_transaction_ref: external_transaction_ref
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty()),
        };

        let command = OrderCommand::SubmitPaymentProof {
            requested_by: caller,
            proof,
        };

        let result: Result<OrderAggregate, OrderServiceError> = self
            .orders
            .execute(order_id, command, Uuid::new_v4())
            .await
            .map(|outcome| outcome.order)
            .map_err(Into::into);

        match &result {
            Ok(order) => {
                self.metrics.record_payment_proof("accepted");
                self.metrics
                    .record_transition(OrderStatus::AwaitingPayment.as_str(), order.status.as_str());

                tracing::info!(
                    order_id = %order.id,
                    owner_id = %order.owner_id,
                    artifact_ref = ?order.proof_of_payment_reference,
                    "Payment proof submitted, order awaiting review"
                );

                self.notifications
                    .notify(OrderNotification::status_changed(order, OrderStatus::AwaitingPayment));
            }
            Err(e) => {
                self.metrics.record_payment_proof(e.kind());
                tracing::warn!(order_id = %order_id, error = %e, "Payment proof rejected");
            }
        }

        result
    }
}
