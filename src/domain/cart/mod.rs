// ============================================================================
// Cart Domain
// ============================================================================

pub mod model;
pub mod store;

pub use model::{Cart, CartError, CartLine};
pub use store::{CartStore, InMemoryCartStore};
