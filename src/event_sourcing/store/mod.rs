// ============================================================================
// Event Sourcing Store - Generic Persistence Layer
// ============================================================================
//
// This module contains GENERIC persistence infrastructure for event sourcing.
// All components work with ANY aggregate/event type.
//
// ============================================================================

pub mod event_store;
pub mod memory;
pub mod scylla_store;

pub use event_store::{load_aggregate, EventStore, EventStoreError};
pub use memory::InMemoryEventStore;
pub use scylla_store::ScyllaEventStore;
