// ============================================================================
// Order Domain - Business Logic for Order Aggregate
// ============================================================================
//
// This module contains ALL Order-specific code:
// - Value objects (OrderLine, OrderStatus, PaymentMethod, DeliveryDetails)
// - Events (OrderPlaced, PaymentProofSubmitted, OrderCancelled, etc.)
// - Commands (PlaceOrder, SubmitPaymentProof, ChangeStatus)
// - Errors (OrderError enum)
// - Status machine (legal transitions per role)
// - Aggregate (OrderAggregate with business logic)
// - Command Handler (OrderCommandHandler)
// - Repository (event stream + list projection)
//
// ============================================================================

pub mod value_objects;
pub mod events;
pub mod commands;
pub mod errors;
pub mod state_machine;
pub mod aggregate;
pub mod command_handler;
pub mod repository;

// Re-export for convenience
pub use value_objects::*;
pub use events::*;
pub use commands::*;
pub use errors::*;
pub use state_machine::{check_transition, Transition};
pub use aggregate::*;
pub use command_handler::*;
pub use repository::*;
