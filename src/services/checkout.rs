use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::domain::cart::CartStore;
use crate::domain::catalog::ProductCatalog;
use crate::domain::inventory::{InventoryLedger, Reservation};
use crate::domain::order::{
    DeliveryDetails, OrderAggregate, OrderCommand, OrderCommandError, OrderError, OrderLine, OrderRepository,
    PaymentMethod,
};
use crate::metrics::Metrics;
use super::errors::OrderServiceError;
use super::notifications::{NotificationSink, OrderNotification};
use super::shipping::ShippingPolicy;

// ============================================================================
// Checkout Orchestrator
// ============================================================================
//
// Cart → Order conversion:
//   1. read the authoritative cart (never the client's copy)
//   2. reserve every line in ascending product order, all-or-nothing
//   3. snapshot name and price of each line while its stock is held
//   4. price the order (subtotal + shipping)
//   5. persist the order, then take the ordered lines out of the cart
//   6. hand the creation event to the notification sink
//
// Reservations are held by a `Reservation` guard. From the moment the order
// is submitted for persistence, the outcome is owned by a spawned task, so a
// caller that gives up mid-flight can neither leak stock nor release stock
// that now belongs to a persisted order.
//
// ============================================================================

pub struct CheckoutService {
    carts: Arc<dyn CartStore>,
    catalog: Arc<dyn ProductCatalog>,
    inventory: Arc<dyn InventoryLedger>,
    orders: Arc<OrderRepository>,
    shipping: Arc<dyn ShippingPolicy>,
    notifications: Arc<dyn NotificationSink>,
    metrics: Arc<Metrics>,
}

impl CheckoutService {
    pub fn new(
        carts: Arc<dyn CartStore>,
        catalog: Arc<dyn ProductCatalog>,
        inventory: Arc<dyn InventoryLedger>,
        orders: Arc<OrderRepository>,
        shipping: Arc<dyn ShippingPolicy>,
        notifications: Arc<dyn NotificationSink>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            carts,
            catalog,
            inventory,
            orders,
            shipping,
            notifications,
            metrics,
        }
    }

    pub async fn checkout(
        &self,
        owner_id: Uuid,
        delivery: DeliveryDetails,
        payment_method: PaymentMethod,
    ) -> Result<OrderAggregate, OrderServiceError> {
        let started = Instant::now();
        let result = self.try_checkout(owner_id, delivery, payment_method).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.kind(),
        };
        self.metrics
            .record_checkout(outcome, started.elapsed().as_secs_f64());

        result
    }

    async fn try_checkout(
        &self,
        owner_id: Uuid,
        delivery: DeliveryDetails,
        payment_method: PaymentMethod,
    ) -> Result<OrderAggregate, OrderServiceError> {
        delivery.validate().map_err(OrderServiceError::InvalidInput)?;

        let cart = self.carts.get(owner_id).await?;
        if cart.is_empty() {
            tracing::debug!(owner_id = %owner_id, "Checkout rejected: empty cart");
            return Err(OrderServiceError::EmptyCart);
        }

        let mut cart_lines = cart.lines;
        cart_lines.sort_by_key(|line| line.product_id);

        let mut reservation = Reservation::new(self.inventory.clone());
        let mut lines = Vec::with_capacity(cart_lines.len());

        for cart_line in &cart_lines {
            if let Err(e) = reservation.reserve(cart_line.product_id, cart_line.quantity).await {
                self.metrics.record_inventory("reserve", "rejected");
                tracing::warn!(
                    owner_id = %owner_id,
                    product_id = %cart_line.product_id,
                    quantity = cart_line.quantity,
                    error = %e,
                    "Checkout rejected: reservation failed"
                );
                reservation.release_all().await;
                return Err(e.into());
            }
            self.metrics.record_inventory("reserve", "ok");

            let product = match self.catalog.get_product(cart_line.product_id).await {
                Ok(Some(product)) => product,
                Ok(None) => {
                    tracing::warn!(product_id = %cart_line.product_id, "Product missing from catalog at checkout");
                    reservation.release_all().await;
                    return Err(OrderServiceError::InsufficientStock {
                        product_id: cart_line.product_id,
                    });
                }
                Err(e) => {
                    reservation.release_all().await;
                    return Err(OrderServiceError::Storage(e));
                }
            };

            lines.push(OrderLine {
                product_id: product.id,
                name: product.name,
                unit_price: product.unit_price,
                quantity: cart_line.quantity,
            });
        }

        let subtotal: Decimal = lines.iter().map(OrderLine::line_total).sum();
        let shipping_charge = self.shipping.shipping_charge(subtotal);

        let order_id = Uuid::now_v7();
        let command = OrderCommand::PlaceOrder {
            owner_id,
            lines,
            delivery,
            shipping_charge,
            payment_method,
        };

        let order = self.persist(order_id, command, reservation).await?;

        // Lines added while the order was persisting were never ordered
        if let Err(e) = self.carts.remove_ordered(owner_id, &cart_lines).await {
            tracing::error!(
                order_id = %order.id,
                owner_id = %owner_id,
                error = %e,
                "Order placed but the ordered lines could not be removed from the cart"
            );
        }

        tracing::info!(
            order_id = %order.id,
            owner_id = %owner_id,
            status = %order.status,
            subtotal = %order.subtotal,
            shipping = %order.shipping_charge,
            total = %order.total,
            lines = order.lines.len(),
            "Checkout completed"
        );

        self.notifications.notify(OrderNotification::created(&order));

        Ok(order)
    }

    async fn persist(
        &self,
        order_id: Uuid,
        command: OrderCommand,
        reservation: Reservation,
    ) -> Result<OrderAggregate, OrderServiceError> {
        let orders = self.orders.clone();

        let task = tokio::spawn(async move {
            match orders.create(order_id, command, Uuid::new_v4()).await {
                Ok(order) => {
                    reservation.commit();
                    Ok(order)
                }
                Err(e) => {
                    reservation.release_all().await;
                    Err(e)
                }
            }
        });

        match task.await {
            Ok(Ok(order)) => Ok(order),
            Ok(Err(OrderCommandError::Rejected(e))) if e != OrderError::AlreadyExists => {
                tracing::warn!(order_id = %order_id, error = %e, "Order rejected at creation");
                Err(e.into())
            }
            Ok(Err(e)) => {
                tracing::error!(order_id = %order_id, error = %e, "Order persistence failed, stock released");
                Err(OrderServiceError::OrderPersistenceFailed(e.to_string()))
            }
            Err(e) => {
                tracing::error!(order_id = %order_id, error = %e, "Order persistence task failed");
                Err(OrderServiceError::OrderPersistenceFailed(e.to_string()))
            }
        }
    }
}
