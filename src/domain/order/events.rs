use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::identity::Role;
use crate::event_sourcing::core::DomainEvent;
use super::value_objects::{DeliveryDetails, OrderLine, OrderStatus, PaymentMethod};

// ============================================================================
// Order Events - Domain Events for Order Aggregate
// ============================================================================

/// Order Event - Union type for all order events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    Placed(OrderPlaced),
    PaymentProofSubmitted(PaymentProofSubmitted),
    Shipped(OrderShipped),
    Delivered(OrderDelivered),
    Cancelled(OrderCancelled),
}

impl OrderEvent {
    /// Status the order is in once this event is applied
    pub fn resulting_status(&self) -> OrderStatus {
        match self {
            OrderEvent::Placed(e) => e.initial_status,
            OrderEvent::PaymentProofSubmitted(_) => OrderStatus::Processing,
            OrderEvent::Shipped(_) => OrderStatus::Shipped,
            OrderEvent::Delivered(_) => OrderStatus::Delivered,
            OrderEvent::Cancelled(_) => OrderStatus::Cancelled,
        }
    }

    /// Status the order left, `None` for the creation event
    pub fn previous_status(&self) -> Option<OrderStatus> {
        match self {
            OrderEvent::Placed(_) => None,
            OrderEvent::PaymentProofSubmitted(_) => Some(OrderStatus::AwaitingPayment),
            OrderEvent::Shipped(_) => Some(OrderStatus::Processing),
            OrderEvent::Delivered(_) => Some(OrderStatus::Shipped),
            OrderEvent::Cancelled(e) => Some(e.previous_status),
        }
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::Placed(e) => e.placed_at,
            OrderEvent::PaymentProofSubmitted(e) => e.submitted_at,
            OrderEvent::Shipped(e) => e.shipped_at,
            OrderEvent::Delivered(e) => e.delivered_at,
            OrderEvent::Cancelled(e) => e.cancelled_at,
        }
    }
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::Placed(_) => "OrderPlaced",
            OrderEvent::PaymentProofSubmitted(_) => "PaymentProofSubmitted",
            OrderEvent::Shipped(_) => "OrderShipped",
            OrderEvent::Delivered(_) => "OrderDelivered",
            OrderEvent::Cancelled(_) => "OrderCancelled",
        }
    }
}

// ============================================================================
// Individual Event Types
// ============================================================================

/// Order Placed - Initial event, carries the full immutable snapshot
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct OrderPlaced {
    pub owner_id: Uuid,
    pub lines: Vec<OrderLine>,
    pub delivery: DeliveryDetails,
    pub subtotal: Decimal,
    pub shipping_charge: Decimal,
    pub total: Decimal,
    pub payment_method: PaymentMethod,
    pub initial_status: OrderStatus,
    pub placed_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PaymentProofSubmitted {
    pub submitted_by: Uuid,
    pub artifact_ref: String,
    pub external_transaction_ref: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct OrderShipped {
    pub shipped_by: Uuid,
    pub shipped_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct OrderDelivered {
    pub delivered_by: Uuid,
    pub delivered_at: DateTime<Utc>,
}

/// Order Cancelled - Terminal. Stock for every line goes back to the ledger
/// when this event is appended.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct OrderCancelled {
    pub cancelled_by: Uuid,
    pub by_role: Role,
    pub reason: Option<String>,
    pub previous_status: OrderStatus,
    pub cancelled_at: DateTime<Utc>,
}
