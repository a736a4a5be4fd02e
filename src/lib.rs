/*!
 * condlatch
 * Wait/notify coordination primitives: wait queue, signals and one-shot latch
 */

pub mod core;
pub mod monitoring;

// Re-exports
pub use crate::core::sync::interrupt::interrupted;
pub use crate::core::sync::{
    Condition, InterruptHandle, Outcome, Signal, SimpleCondition, StrategyType, SyncConfig,
    WaitError, WaitQueue, WaitResult, WakeResult,
};
pub use monitoring::{init_tracing, WaitSpan};
