use super::value_objects::OrderStatus;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrderError {
    #[error("Caller is not allowed to perform this operation on the order")]
    NotAuthorized,

    #[error("Illegal status transition: {from} -> {to}")]
    IllegalStatusTransition { from: OrderStatus, to: OrderStatus },

    #[error("Order is not awaiting payment (status: {0})")]
    NotAwaitingPayment(OrderStatus),

    #[error("Proof-of-payment artifact reference is required")]
    MissingProof,

    #[error("Order lines cannot be empty")]
    EmptyLines,

    #[error("Invalid line quantity: {0}")]
    InvalidQuantity(u32),

    #[error("Invalid unit price for product {0}")]
    InvalidPrice(uuid::Uuid),

    #[error("Invalid delivery details: {0}")]
    InvalidDelivery(String),

    #[error("Shipping charge cannot be negative")]
    NegativeShippingCharge,

    #[error("Order already exists")]
    AlreadyExists,

    #[error("Aggregate not initialized")]
    NotInitialized,
}
