use uuid::Uuid;

use crate::domain::cart::CartError;
use crate::domain::inventory::InventoryError;
use crate::domain::order::{OrderCommandError, OrderError, OrderStatus};
use crate::event_sourcing::EventStoreError;

// ============================================================================
// Service Error Taxonomy
// ============================================================================
//
// Every operation of the order lifecycle reports one of these. Client errors
// carry enough detail to act on and are never retried; the rest are
// infrastructure failures scoped to the request.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderServiceError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Insufficient stock for product {product_id}")]
    InsufficientStock { product_id: Uuid },

    #[error("Order could not be persisted: {0}")]
    OrderPersistenceFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Caller is not allowed to perform this operation")]
    NotAuthorized,

    #[error("Illegal status transition: {from} -> {to}")]
    IllegalStatusTransition { from: OrderStatus, to: OrderStatus },

    #[error("Order is not awaiting payment (status: {0})")]
    NotAwaitingPayment(OrderStatus),

    #[error("Proof-of-payment artifact reference is required")]
    MissingProof,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl OrderServiceError {
    pub fn order_not_found(order_id: Uuid) -> Self {
        OrderServiceError::NotFound(format!("order {}", order_id))
    }

    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            OrderServiceError::OrderPersistenceFailed(_) | OrderServiceError::Storage(_)
        )
    }

    /// Stable name used in response bodies and metric labels
    pub fn kind(&self) -> &'static str {
        match self {
            OrderServiceError::EmptyCart => "empty_cart",
            OrderServiceError::InsufficientStock { .. } => "insufficient_stock",
            OrderServiceError::OrderPersistenceFailed(_) => "order_persistence_failed",
            OrderServiceError::NotFound(_) => "not_found",
            OrderServiceError::NotAuthorized => "not_authorized",
            OrderServiceError::IllegalStatusTransition { .. } => "illegal_status_transition",
            OrderServiceError::NotAwaitingPayment(_) => "not_awaiting_payment",
            OrderServiceError::MissingProof => "missing_proof",
            OrderServiceError::InvalidInput(_) => "invalid_input",
            OrderServiceError::Storage(_) => "storage",
        }
    }
}

impl From<OrderError> for OrderServiceError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::NotAuthorized => OrderServiceError::NotAuthorized,
            OrderError::IllegalStatusTransition { from, to } => {
                OrderServiceError::IllegalStatusTransition { from, to }
            }
            OrderError::NotAwaitingPayment(status) => OrderServiceError::NotAwaitingPayment(status),
            OrderError::MissingProof => OrderServiceError::MissingProof,
            OrderError::EmptyLines => OrderServiceError::EmptyCart,
            OrderError::InvalidQuantity(_)
            | OrderError::InvalidPrice(_)
            | OrderError::InvalidDelivery(_)
            | OrderError::NegativeShippingCharge => OrderServiceError::InvalidInput(err.to_string()),
            OrderError::AlreadyExists => OrderServiceError::OrderPersistenceFailed(err.to_string()),
            OrderError::NotInitialized => OrderServiceError::Storage(anyhow::Error::new(err)),
        }
    }
}

impl From<EventStoreError> for OrderServiceError {
    fn from(err: EventStoreError) -> Self {
        OrderServiceError::Storage(anyhow::Error::new(err))
    }
}

impl From<OrderCommandError> for OrderServiceError {
    fn from(err: OrderCommandError) -> Self {
        match err {
            OrderCommandError::NotFound(order_id) => OrderServiceError::order_not_found(order_id),
            OrderCommandError::Rejected(e) => e.into(),
            OrderCommandError::Store(e) => e.into(),
        }
    }
}

impl From<CartError> for OrderServiceError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::InvalidQuantity | CartError::QuantityOverflow(_) => {
                OrderServiceError::InvalidInput(err.to_string())
            }
            CartError::LineNotFound(product_id) => {
                OrderServiceError::NotFound(format!("product {} in cart", product_id))
            }
            CartError::UnknownProduct(product_id) => {
                OrderServiceError::NotFound(format!("product {}", product_id))
            }
            CartError::Backend(e) => OrderServiceError::Storage(e),
        }
    }
}

impl From<InventoryError> for OrderServiceError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::InsufficientStock { product_id, .. } | InventoryError::UnknownProduct(product_id) => {
                OrderServiceError::InsufficientStock { product_id }
            }
            InventoryError::InvalidQuantity => OrderServiceError::InvalidInput(err.to_string()),
            InventoryError::CounterOverflow(_) => OrderServiceError::Storage(anyhow::Error::new(err)),
            InventoryError::Backend(e) => OrderServiceError::Storage(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_are_distinguished_from_infrastructure() {
        let product_id = Uuid::new_v4();

        assert!(OrderServiceError::EmptyCart.is_client_error());
        assert!(OrderServiceError::InsufficientStock { product_id }.is_client_error());
        assert!(OrderServiceError::MissingProof.is_client_error());
        assert!(!OrderServiceError::OrderPersistenceFailed("down".to_string()).is_client_error());
        assert!(!OrderServiceError::Storage(anyhow::anyhow!("down")).is_client_error());
    }

    #[test]
    fn test_lost_reservation_race_surfaces_as_insufficient_stock() {
        let product_id = Uuid::new_v4();
        let err: OrderServiceError = InventoryError::InsufficientStock {
            product_id,
            requested: 2,
            available: 1,
        }
        .into();

        assert!(matches!(err, OrderServiceError::InsufficientStock { product_id: p } if p == product_id));
        assert_eq!(err.kind(), "insufficient_stock");
    }

    #[test]
    fn test_command_errors_map_to_taxonomy() {
        let order_id = Uuid::new_v4();

        let not_found: OrderServiceError = OrderCommandError::NotFound(order_id).into();
        assert!(matches!(not_found, OrderServiceError::NotFound(ref what) if what.contains(&order_id.to_string())));

        let illegal: OrderServiceError = OrderCommandError::Rejected(OrderError::IllegalStatusTransition {
            from: OrderStatus::Delivered,
            to: OrderStatus::Processing,
        })
        .into();
        assert!(matches!(
            illegal,
            OrderServiceError::IllegalStatusTransition {
                from: OrderStatus::Delivered,
                to: OrderStatus::Processing
            }
        ));
    }
}
