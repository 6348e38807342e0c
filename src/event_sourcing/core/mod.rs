// ============================================================================
// Event Sourcing Core - Generic Infrastructure Abstractions
// ============================================================================
//
// GENERIC, reusable event sourcing infrastructure that works with ANY
// domain aggregate. No Order, Cart or Inventory code lives here.
//
// ============================================================================

pub mod aggregate;
pub mod event;

pub use aggregate::{Aggregate, ReplayError};
pub use event::{DomainEvent, EventEnvelope, serialize_event, deserialize_event};
