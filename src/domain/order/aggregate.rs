use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::identity::{Caller, Role};
use crate::event_sourcing::core::Aggregate;
use super::commands::OrderCommand;
use super::errors::OrderError;
use super::events::*;
use super::state_machine::{check_transition, Transition};
use super::value_objects::{DeliveryDetails, OrderLine, OrderStatus, PaymentMethod, PaymentProof};

// ============================================================================
// Order Aggregate - Domain Logic
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderAggregate {
    // Identity
    pub id: Uuid,
    pub version: i64,

    // Immutable snapshot (from OrderPlaced)
    pub owner_id: Uuid,
    pub lines: Vec<OrderLine>,
    pub delivery: DeliveryDetails,
    pub subtotal: Decimal,
    pub shipping_charge: Decimal,
    pub total: Decimal,
    pub payment_method: PaymentMethod,

    // Mutable part
    pub status: OrderStatus,
    pub proof_of_payment_reference: Option<String>,
    pub external_transaction_reference: Option<String>,
    pub cancellation_reason: Option<String>,

    // Audit Trail
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderAggregate {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }

    /// Owners see their own orders, administrators see everything
    pub fn is_visible_to(&self, caller: &Caller) -> bool {
        caller.is_administrator() || self.is_owned_by(caller.user_id)
    }

    fn handle_payment_proof(&self, requested_by: &Caller, proof: &PaymentProof) -> Result<Vec<OrderEvent>, OrderError> {
        if !self.is_owned_by(requested_by.user_id) {
            return Err(OrderError::NotAuthorized);
        }

        if proof.artifact_ref.trim().is_empty() {
            return Err(OrderError::MissingProof);
        }

        if self.payment_method != PaymentMethod::PrepaidManualVerification
            || self.status != OrderStatus::AwaitingPayment
        {
            return Err(OrderError::NotAwaitingPayment(self.status));
        }

        Ok(vec![OrderEvent::PaymentProofSubmitted(PaymentProofSubmitted {
            submitted_by: requested_by.user_id,
            artifact_ref: proof.artifact_ref.trim().to_string(),
            external_transaction_ref: proof
                .external_transaction_ref
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string),
            submitted_at: Utc::now(),
        })])
    }

    fn handle_status_change(
        &self,
        requested_by: &Caller,
        target: OrderStatus,
        reason: &Option<String>,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        if requested_by.role == Role::Customer && !self.is_owned_by(requested_by.user_id) {
            return Err(OrderError::NotAuthorized);
        }

        if check_transition(self.status, target, requested_by.role)? == Transition::AlreadyApplied {
            return Ok(vec![]);
        }

        let now = Utc::now();
        let event = match target {
            OrderStatus::Shipped => OrderEvent::Shipped(OrderShipped {
                shipped_by: requested_by.user_id,
                shipped_at: now,
            }),
            OrderStatus::Delivered => OrderEvent::Delivered(OrderDelivered {
                delivered_by: requested_by.user_id,
                delivered_at: now,
            }),
            OrderStatus::Cancelled => OrderEvent::Cancelled(OrderCancelled {
                cancelled_by: requested_by.user_id,
                by_role: requested_by.role,
                reason: reason.clone(),
                previous_status: self.status,
                cancelled_at: now,
            }),
            OrderStatus::AwaitingPayment | OrderStatus::Processing => {
                return Err(OrderError::IllegalStatusTransition { from: self.status, to: target })
            }
        };

        Ok(vec![event])
    }
}

fn validate_placement(
    lines: &[OrderLine],
    delivery: &DeliveryDetails,
    shipping_charge: Decimal,
) -> Result<(), OrderError> {
    if lines.is_empty() {
        return Err(OrderError::EmptyLines);
    }

    for line in lines {
        if line.quantity == 0 {
            return Err(OrderError::InvalidQuantity(line.quantity));
        }
        if line.unit_price <= Decimal::ZERO {
            return Err(OrderError::InvalidPrice(line.product_id));
        }
    }

    if shipping_charge < Decimal::ZERO {
        return Err(OrderError::NegativeShippingCharge);
    }

    delivery.validate().map_err(OrderError::InvalidDelivery)
}

// ============================================================================
// Aggregate Trait Implementation
// ============================================================================

impl Aggregate for OrderAggregate {
    type Event = OrderEvent;
    type Command = OrderCommand;
    type Error = OrderError;

    fn apply_first_event(aggregate_id: Uuid, event: &Self::Event) -> Result<Self, Self::Error> {
        match event {
            OrderEvent::Placed(e) => Ok(Self {
                id: aggregate_id,
                version: 0,
                owner_id: e.owner_id,
                lines: e.lines.clone(),
                delivery: e.delivery.clone(),
                subtotal: e.subtotal,
                shipping_charge: e.shipping_charge,
                total: e.total,
                payment_method: e.payment_method,
                status: e.initial_status,
                proof_of_payment_reference: None,
                external_transaction_reference: None,
                cancellation_reason: None,
                created_at: e.placed_at,
                updated_at: e.placed_at,
            }),
            _ => Err(OrderError::NotInitialized),
        }
    }

    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error> {
        match event {
            OrderEvent::Placed(_) => return Err(OrderError::AlreadyExists),
            OrderEvent::PaymentProofSubmitted(e) => {
                self.proof_of_payment_reference = Some(e.artifact_ref.clone());
                self.external_transaction_reference = e.external_transaction_ref.clone();
            }
            OrderEvent::Shipped(_) | OrderEvent::Delivered(_) => {}
            OrderEvent::Cancelled(e) => {
                self.cancellation_reason = e.reason.clone();
            }
        }

        self.status = event.resulting_status();
        self.updated_at = event.occurred_at();
        Ok(())
    }

    fn handle_creation(command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            OrderCommand::PlaceOrder {
                owner_id,
                lines,
                delivery,
                shipping_charge,
                payment_method,
            } => {
                validate_placement(lines, delivery, *shipping_charge)?;

                let subtotal: Decimal = lines.iter().map(OrderLine::line_total).sum();

                Ok(vec![OrderEvent::Placed(OrderPlaced {
                    owner_id: *owner_id,
                    lines: lines.clone(),
                    delivery: delivery.clone(),
                    subtotal,
                    shipping_charge: *shipping_charge,
                    total: subtotal + *shipping_charge,
                    payment_method: *payment_method,
                    initial_status: payment_method.initial_status(),
                    placed_at: Utc::now(),
                })])
            }
            _ => Err(OrderError::NotInitialized),
        }
    }

    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            OrderCommand::PlaceOrder { .. } => Err(OrderError::AlreadyExists),
            OrderCommand::SubmitPaymentProof { requested_by, proof } => {
                self.handle_payment_proof(requested_by, proof)
            }
            OrderCommand::ChangeStatus { requested_by, target, reason } => {
                self.handle_status_change(requested_by, *target, reason)
            }
        }
    }

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_sourcing::core::EventEnvelope;
    use rust_decimal_macros::dec;

    fn delivery() -> DeliveryDetails {
        DeliveryDetails {
            name: "Grace Hopper".to_string(),
            phone: "555-0100-22".to_string(),
            address: "1 Harbor Rd".to_string(),
        }
    }

    fn line(price: Decimal, quantity: u32) -> OrderLine {
        OrderLine {
            product_id: Uuid::new_v4(),
            name: "Widget".to_string(),
            unit_price: price,
            quantity,
        }
    }

    fn place(owner_id: Uuid, payment_method: PaymentMethod) -> OrderAggregate {
        let command = OrderCommand::PlaceOrder {
            owner_id,
            lines: vec![line(dec!(100), 2), line(dec!(12.50), 1)],
            delivery: delivery(),
            shipping_charge: dec!(5),
            payment_method,
        };
        let events = OrderAggregate::handle_creation(&command).unwrap();
        let mut order = OrderAggregate::apply_first_event(Uuid::new_v4(), &events[0]).unwrap();
        order.set_version(1);
        order
    }

    fn apply_all(order: &mut OrderAggregate, events: Vec<OrderEvent>) {
        for event in events {
            order.apply_event(&event).unwrap();
            order.version += 1;
        }
    }

    #[test]
    fn test_place_order_computes_totals() {
        let order = place(Uuid::new_v4(), PaymentMethod::CashOnDelivery);

        assert_eq!(order.subtotal, dec!(212.50));
        assert_eq!(order.shipping_charge, dec!(5));
        assert_eq!(order.total, dec!(217.50));
        assert_eq!(order.status, OrderStatus::Processing);
    }

    #[test]
    fn test_prepaid_order_awaits_payment() {
        let order = place(Uuid::new_v4(), PaymentMethod::PrepaidManualVerification);
        assert_eq!(order.status, OrderStatus::AwaitingPayment);
    }

    #[test]
    fn test_place_order_validation() {
        let mut command = OrderCommand::PlaceOrder {
            owner_id: Uuid::new_v4(),
            lines: vec![],
            delivery: delivery(),
            shipping_charge: dec!(0),
            payment_method: PaymentMethod::CashOnDelivery,
        };
        assert_eq!(OrderAggregate::handle_creation(&command).unwrap_err(), OrderError::EmptyLines);

        if let OrderCommand::PlaceOrder { lines, shipping_charge, .. } = &mut command {
            lines.push(line(dec!(3), 1));
            *shipping_charge = dec!(-1);
        }
        assert_eq!(
            OrderAggregate::handle_creation(&command).unwrap_err(),
            OrderError::NegativeShippingCharge
        );
    }

    #[test]
    fn test_payment_proof_moves_to_processing() {
        let owner = Uuid::new_v4();
        let mut order = place(owner, PaymentMethod::PrepaidManualVerification);

        let command = OrderCommand::SubmitPaymentProof {
            requested_by: Caller::customer(owner),
            proof: PaymentProof {
                artifact_ref: "uploads/receipt-1.png".to_string(),
                external_transaction_ref: Some("TXN-42".to_string()),
            },
        };
        let events = order.handle_command(&command).unwrap();
        apply_all(&mut order, events);

        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.proof_of_payment_reference.as_deref(), Some("uploads/receipt-1.png"));
        assert_eq!(order.external_transaction_reference.as_deref(), Some("TXN-42"));

        // Second submission is rejected
        assert_eq!(
            order.handle_command(&command).unwrap_err(),
            OrderError::NotAwaitingPayment(OrderStatus::Processing)
        );
    }

    #[test]
    fn test_payment_proof_error_precedence() {
        let owner = Uuid::new_v4();
        let order = place(owner, PaymentMethod::CashOnDelivery);

        let stranger = OrderCommand::SubmitPaymentProof {
            requested_by: Caller::customer(Uuid::new_v4()),
            proof: PaymentProof { artifact_ref: "".to_string(), external_transaction_ref: None },
        };
        assert_eq!(order.handle_command(&stranger).unwrap_err(), OrderError::NotAuthorized);

        let missing = OrderCommand::SubmitPaymentProof {
            requested_by: Caller::customer(owner),
            proof: PaymentProof { artifact_ref: "  ".to_string(), external_transaction_ref: None },
        };
        assert_eq!(order.handle_command(&missing).unwrap_err(), OrderError::MissingProof);

        let cod = OrderCommand::SubmitPaymentProof {
            requested_by: Caller::customer(owner),
            proof: PaymentProof { artifact_ref: "receipt".to_string(), external_transaction_ref: None },
        };
        assert_eq!(
            order.handle_command(&cod).unwrap_err(),
            OrderError::NotAwaitingPayment(OrderStatus::Processing)
        );
    }

    #[test]
    fn test_owner_cancel_is_idempotent() {
        let owner = Uuid::new_v4();
        let mut order = place(owner, PaymentMethod::CashOnDelivery);
        let cancel = OrderCommand::cancel(Caller::customer(owner), Some("changed my mind".to_string()));

        let events = order.handle_command(&cancel).unwrap();
        assert_eq!(events.len(), 1);
        apply_all(&mut order, events);
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(order.cancellation_reason.as_deref(), Some("changed my mind"));

        let events = order.handle_command(&cancel).unwrap();
        assert!(events.is_empty());
        assert_eq!(order.status, OrderStatus::Cancelled);
    }

    #[test]
    fn test_stranger_cannot_cancel() {
        let order = place(Uuid::new_v4(), PaymentMethod::CashOnDelivery);
        let cancel = OrderCommand::cancel(Caller::customer(Uuid::new_v4()), None);
        assert_eq!(order.handle_command(&cancel).unwrap_err(), OrderError::NotAuthorized);
    }

    #[test]
    fn test_admin_fulfillment() {
        let mut order = place(Uuid::new_v4(), PaymentMethod::CashOnDelivery);
        let admin = Caller::administrator(Uuid::new_v4());

        for target in [OrderStatus::Shipped, OrderStatus::Delivered] {
            let command = OrderCommand::ChangeStatus { requested_by: admin, target, reason: None };
            let events = order.handle_command(&command).unwrap();
            apply_all(&mut order, events);
            assert_eq!(order.status, target);
        }

        let back = OrderCommand::ChangeStatus {
            requested_by: admin,
            target: OrderStatus::Processing,
            reason: None,
        };
        assert_eq!(
            order.handle_command(&back).unwrap_err(),
            OrderError::IllegalStatusTransition {
                from: OrderStatus::Delivered,
                to: OrderStatus::Processing,
            }
        );
        assert_eq!(order.status, OrderStatus::Delivered);
    }

    #[test]
    fn test_load_from_events_replays_history() {
        let owner = Uuid::new_v4();
        let order_id = Uuid::new_v4();
        let placed = OrderAggregate::handle_creation(&OrderCommand::PlaceOrder {
            owner_id: owner,
            lines: vec![line(dec!(10), 1)],
            delivery: delivery(),
            shipping_charge: dec!(0),
            payment_method: PaymentMethod::CashOnDelivery,
        })
        .unwrap()
        .remove(0);

        let cancelled = OrderEvent::Cancelled(OrderCancelled {
            cancelled_by: owner,
            by_role: Role::Customer,
            reason: None,
            previous_status: OrderStatus::Processing,
            cancelled_at: Utc::now(),
        });

        let envelopes = vec![
            EventEnvelope::new(order_id, 1, placed, Uuid::new_v4()),
            EventEnvelope::new(order_id, 2, cancelled.clone(), Uuid::new_v4()),
        ];

        let order = OrderAggregate::load_from_events(envelopes).unwrap();
        assert_eq!(order.id, order_id);
        assert_eq!(order.version, 2);
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(order.updated_at, cancelled.occurred_at());
    }
}
