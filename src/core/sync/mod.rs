/*!
 * Synchronization Primitives
 *
 * Wait/notify coordination without lost or spurious wakeups:
 * - `WaitQueue`: unbounded set of parked waiters with broadcast release
 * - `Signal`: cancelable per-waiter handle returned by registration
 * - `SimpleCondition`: one-shot latch built on a lazily created queue
 *
 * # Architecture
 *
 * Registration and release meet at a single synchronization point (the
 * queue's entry set), and every waiter re-checks its condition after
 * registering. A release that happens before the re-check is seen by the
 * re-check; a release that happens after it finds the registration.
 *
 * # Performance
 *
 * - Already-signaled fast path is a single atomic load
 * - Parking via parking_lot_core (futex on Linux)
 * - Optional bounded spin before parking
 *
 * # Use Cases
 *
 * - **Flush completion**: block until a memtable flush finishes
 * - **Durability acks**: wait for a commit log sync
 * - **Background readiness**: wait for a task to finish starting up
 */

mod condition;
mod config;
pub mod interrupt;
mod signal;
mod spinwait;
mod traits;
mod wait;

pub use condition::SimpleCondition;
pub use config::{StrategyType, SyncConfig};
pub use interrupt::InterruptHandle;
pub use signal::{Outcome, Signal};
pub use traits::{Condition, WakeResult};
pub use wait::{WaitError, WaitQueue, WaitResult};
