// ============================================================================
// Inventory Domain
// ============================================================================
//
// - Ledger: per-product available counters with atomic reserve/release
// - Reservation: scoped hold that releases on every exit path unless committed
//
// ============================================================================

pub mod ledger;
pub mod reservation;

pub use ledger::{InMemoryInventoryLedger, InventoryError, InventoryLedger};
pub use reservation::Reservation;
