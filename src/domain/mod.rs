// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Each aggregate or owned resource has its own module:
// - order: event-sourced order aggregate, status machine, repository
// - inventory: per-product stock ledger and scoped reservations
// - cart: per-user mutable cart
// - catalog: read accessor for product name and price
// - identity: caller and role handed in by the authentication layer
//
// This layer is completely separate from the event sourcing infrastructure
// and from any transport.
//
// ============================================================================

pub mod identity;
pub mod catalog;
pub mod inventory;
pub mod cart;
pub mod order;
