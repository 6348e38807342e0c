use std::sync::Arc;
use uuid::Uuid;

use crate::domain::identity::Caller;
use crate::domain::inventory::InventoryLedger;
use crate::domain::order::{OrderAggregate, OrderCommand, OrderEvent, OrderRepository, OrderStatus};
use crate::metrics::Metrics;
use crate::utils::{retry_with_backoff, RetryConfig};
use super::errors::OrderServiceError;
use super::notifications::{NotificationSink, OrderNotification};

// ============================================================================
// Order Status Service
// ============================================================================
//
// Owner cancellation, administrator transitions and order reads. The status
// machine itself lives in the order aggregate; this service adds the side
// effects of an applied transition: stock release on cancellation, metrics
// and the status-change notification.
//
// ============================================================================

pub struct OrderStatusService {
    orders: Arc<OrderRepository>,
    inventory: Arc<dyn InventoryLedger>,
    notifications: Arc<dyn NotificationSink>,
    metrics: Arc<Metrics>,
}

impl OrderStatusService {
    pub fn new(
        orders: Arc<OrderRepository>,
        inventory: Arc<dyn InventoryLedger>,
        notifications: Arc<dyn NotificationSink>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            orders,
            inventory,
            notifications,
            metrics,
        }
    }

    /// Cancel on behalf of the owner, or forced by an administrator
    pub async fn cancel(
        &self,
        order_id: Uuid,
        caller: Caller,
        reason: Option<String>,
    ) -> Result<OrderAggregate, OrderServiceError> {
        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        self.change_status(order_id, OrderCommand::cancel(caller, reason)).await
    }

    /// Administrator-only transition to `target`
    pub async fn set_status(
        &self,
        order_id: Uuid,
        caller: Caller,
        target: OrderStatus,
    ) -> Result<OrderAggregate, OrderServiceError> {
        if !caller.is_administrator() {
            return Err(OrderServiceError::NotAuthorized);
        }

        let command = OrderCommand::ChangeStatus {
            requested_by: caller,
            target,
            reason: None,
        };
        self.change_status(order_id, command).await
    }

    pub async fn get_order(&self, order_id: Uuid, caller: Caller) -> Result<OrderAggregate, OrderServiceError> {
        let order = self
            .orders
            .get(order_id)
            .await?
            .ok_or_else(|| OrderServiceError::order_not_found(order_id))?;

        if !order.is_visible_to(&caller) {
            return Err(OrderServiceError::NotAuthorized);
        }

        Ok(order)
    }

    /// The caller's own orders, newest first
    pub async fn list_orders(&self, caller: Caller) -> Result<Vec<OrderAggregate>, OrderServiceError> {
        Ok(self.orders.list_by_owner(caller.user_id).await?)
    }

    /// Every order, optionally filtered by status, newest first
    pub async fn list_all_orders(
        &self,
        caller: Caller,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderAggregate>, OrderServiceError> {
        if !caller.is_administrator() {
            return Err(OrderServiceError::NotAuthorized);
        }

        Ok(self.orders.list_all(status).await?)
    }

    async fn change_status(
        &self,
        order_id: Uuid,
        command: OrderCommand,
    ) -> Result<OrderAggregate, OrderServiceError> {
        let outcome = self
            .orders
            .execute(order_id, command, Uuid::new_v4())
            .await
            .inspect_err(|e| tracing::warn!(order_id = %order_id, error = %e, "Status change rejected"))?;

        if outcome.applied.is_empty() {
            tracing::debug!(order_id = %order_id, status = %outcome.order.status, "Status already applied");
        }

        for event in &outcome.applied {
            self.after_transition(&outcome.order, event).await;
        }

        Ok(outcome.order)
    }

    async fn after_transition(&self, order: &OrderAggregate, event: &OrderEvent) {
        let to = event.resulting_status();
        let Some(from) = event.previous_status() else {
            return;
        };

        tracing::info!(
            order_id = %order.id,
            owner_id = %order.owner_id,
            from = %from,
            to = %to,
            "Order status changed"
        );
        self.metrics.record_transition(from.as_str(), to.as_str());

        if to == OrderStatus::Cancelled {
            self.release_stock(order).await;
        }

        self.notifications.notify(OrderNotification::status_changed(order, from));
    }

    // Runs once per appended cancellation, so stock is returned exactly once
    async fn release_stock(&self, order: &OrderAggregate) {
        for line in &order.lines {
            let result = retry_with_backoff(RetryConfig::default(), |_attempt| {
                self.inventory.release(line.product_id, line.quantity)
            })
            .await
            .into_result();

            match result {
                Ok(available) => {
                    self.metrics.record_inventory("release", "ok");
                    tracing::debug!(
                        order_id = %order.id,
                        product_id = %line.product_id,
                        quantity = line.quantity,
                        available = available,
                        "Released stock of cancelled order"
                    );
                }
                Err(e) => {
                    self.metrics.record_inventory("release", "failed");
                    tracing::error!(
                        order_id = %order.id,
                        product_id = %line.product_id,
                        quantity = line.quantity,
                        error = %e,
                        "Failed to release stock of cancelled order"
                    );
                }
            }
        }
    }
}
