use crate::domain::identity::Role;
use super::errors::OrderError;
use super::value_objects::OrderStatus;

// ============================================================================
// Order Status Machine
// ============================================================================
//
//   AwaitingPayment ──proof──▶ Processing ──admin──▶ Shipped ──admin──▶ Delivered
//          │                       │                    │
//          └───────────────────────┴────────────────────┴──▶ Cancelled
//
// - Processing is only reached from AwaitingPayment through a payment proof,
//   never through a status change request.
// - Administrators: Processing → Shipped, Shipped → Delivered, and a forced
//   cancel from any non-terminal state. Shipped → Cancelled is legal here
//   and illegal for owners; the forced cancel returns the stock.
// - Owners: cancel from AwaitingPayment or Processing only.
// - Re-requesting a transition that already happened is a no-op success.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Emit the event that moves the order to the target
    Apply,
    /// The order already sits in the target status
    AlreadyApplied,
}

/// Can `role` move an order from `from` to `to`?
pub fn check_transition(from: OrderStatus, to: OrderStatus, role: Role) -> Result<Transition, OrderError> {
    if !targets_for(role).contains(&to) {
        return Err(match role {
            Role::Customer => OrderError::NotAuthorized,
            Role::Administrator => OrderError::IllegalStatusTransition { from, to },
        });
    }

    if from == to {
        return Ok(Transition::AlreadyApplied);
    }

    if sources_for(to, role).contains(&from) {
        Ok(Transition::Apply)
    } else {
        Err(OrderError::IllegalStatusTransition { from, to })
    }
}

/// Statuses a role may ask for through a status change
fn targets_for(role: Role) -> &'static [OrderStatus] {
    match role {
        Role::Administrator => &[OrderStatus::Shipped, OrderStatus::Delivered, OrderStatus::Cancelled],
        Role::Customer => &[OrderStatus::Cancelled],
    }
}

fn sources_for(to: OrderStatus, role: Role) -> &'static [OrderStatus] {
    match (to, role) {
        (OrderStatus::Shipped, Role::Administrator) => &[OrderStatus::Processing],
        (OrderStatus::Delivered, Role::Administrator) => &[OrderStatus::Shipped],
        (OrderStatus::Cancelled, Role::Administrator) => &[
            OrderStatus::AwaitingPayment,
            OrderStatus::Processing,
            OrderStatus::Shipped,
        ],
        (OrderStatus::Cancelled, Role::Customer) => &[OrderStatus::AwaitingPayment, OrderStatus::Processing],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [OrderStatus; 5] = [
        OrderStatus::AwaitingPayment,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    #[test]
    fn test_admin_fulfillment_path() {
        let admin = Role::Administrator;
        assert_eq!(check_transition(OrderStatus::Processing, OrderStatus::Shipped, admin), Ok(Transition::Apply));
        assert_eq!(check_transition(OrderStatus::Shipped, OrderStatus::Delivered, admin), Ok(Transition::Apply));
    }

    #[test]
    fn test_admin_cannot_skip_steps() {
        let admin = Role::Administrator;
        assert_eq!(
            check_transition(OrderStatus::AwaitingPayment, OrderStatus::Shipped, admin),
            Err(OrderError::IllegalStatusTransition {
                from: OrderStatus::AwaitingPayment,
                to: OrderStatus::Shipped,
            })
        );
        assert!(check_transition(OrderStatus::Processing, OrderStatus::Delivered, admin).is_err());
    }

    #[test]
    fn test_delivered_is_terminal() {
        for role in [Role::Administrator, Role::Customer] {
            for to in ALL {
                if to == OrderStatus::Delivered {
                    continue;
                }
                assert!(
                    check_transition(OrderStatus::Delivered, to, role).is_err(),
                    "{role} moved a delivered order to {to}"
                );
            }
        }

        assert_eq!(
            check_transition(OrderStatus::Delivered, OrderStatus::Processing, Role::Administrator),
            Err(OrderError::IllegalStatusTransition {
                from: OrderStatus::Delivered,
                to: OrderStatus::Processing,
            })
        );
    }

    #[test]
    fn test_cancelled_is_terminal() {
        for to in [OrderStatus::AwaitingPayment, OrderStatus::Processing, OrderStatus::Shipped, OrderStatus::Delivered] {
            assert!(check_transition(OrderStatus::Cancelled, to, Role::Administrator).is_err());
        }
    }

    #[test]
    fn test_owner_cancellation_window() {
        let owner = Role::Customer;
        assert_eq!(check_transition(OrderStatus::AwaitingPayment, OrderStatus::Cancelled, owner), Ok(Transition::Apply));
        assert_eq!(check_transition(OrderStatus::Processing, OrderStatus::Cancelled, owner), Ok(Transition::Apply));
        assert!(matches!(
            check_transition(OrderStatus::Shipped, OrderStatus::Cancelled, owner),
            Err(OrderError::IllegalStatusTransition { .. })
        ));
        assert!(matches!(
            check_transition(OrderStatus::Delivered, OrderStatus::Cancelled, owner),
            Err(OrderError::IllegalStatusTransition { .. })
        ));
    }

    #[test]
    fn test_admin_can_force_cancel_shipped_order() {
        assert_eq!(
            check_transition(OrderStatus::Shipped, OrderStatus::Cancelled, Role::Administrator),
            Ok(Transition::Apply)
        );
    }

    #[test]
    fn test_customer_cannot_drive_fulfillment() {
        assert_eq!(
            check_transition(OrderStatus::Processing, OrderStatus::Shipped, Role::Customer),
            Err(OrderError::NotAuthorized)
        );
    }

    #[test]
    fn test_repeated_transition_is_noop() {
        assert_eq!(
            check_transition(OrderStatus::Cancelled, OrderStatus::Cancelled, Role::Customer),
            Ok(Transition::AlreadyApplied)
        );
        assert_eq!(
            check_transition(OrderStatus::Cancelled, OrderStatus::Cancelled, Role::Administrator),
            Ok(Transition::AlreadyApplied)
        );
        assert_eq!(
            check_transition(OrderStatus::Shipped, OrderStatus::Shipped, Role::Administrator),
            Ok(Transition::AlreadyApplied)
        );
    }

    #[test]
    fn test_processing_is_not_a_requestable_target() {
        assert!(matches!(
            check_transition(OrderStatus::AwaitingPayment, OrderStatus::Processing, Role::Administrator),
            Err(OrderError::IllegalStatusTransition { .. })
        ));
        assert!(matches!(
            check_transition(OrderStatus::Processing, OrderStatus::Processing, Role::Administrator),
            Err(OrderError::IllegalStatusTransition { .. })
        ));
    }
}
