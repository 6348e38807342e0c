use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::identity::Caller;
use super::value_objects::{DeliveryDetails, OrderLine, OrderStatus, PaymentMethod, PaymentProof};

// ============================================================================
// Order Commands - Represent user intent
// ============================================================================

#[derive(Debug, Clone)]
pub enum OrderCommand {
    PlaceOrder {
        owner_id: Uuid,
        lines: Vec<OrderLine>,
        delivery: DeliveryDetails,
        shipping_charge: Decimal,
        payment_method: PaymentMethod,
    },
    SubmitPaymentProof {
        requested_by: Caller,
        proof: PaymentProof,
    },
    ChangeStatus {
        requested_by: Caller,
        target: OrderStatus,
        reason: Option<String>,
    },
}

impl OrderCommand {
    pub fn cancel(requested_by: Caller, reason: Option<String>) -> Self {
        OrderCommand::ChangeStatus {
            requested_by,
            target: OrderStatus::Cancelled,
            reason,
        }
    }

    /// Who issued the command, when known
    pub fn issuer(&self) -> Option<Caller> {
        match self {
            OrderCommand::PlaceOrder { owner_id, .. } => Some(Caller::customer(*owner_id)),
            OrderCommand::SubmitPaymentProof { requested_by, .. }
            | OrderCommand::ChangeStatus { requested_by, .. } => Some(*requested_by),
        }
    }
}
