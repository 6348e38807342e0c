// ============================================================================
// Core Actor Abstractions
// ============================================================================
//
// Generic types shared by the infrastructure actors.
//
// ============================================================================

pub mod health;

pub use health::*;
