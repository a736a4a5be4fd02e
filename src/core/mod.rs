/*!
 * Core Module
 * Fundamental coordination primitives
 */

pub mod sync;

// Re-export for convenience
pub use sync::*;
