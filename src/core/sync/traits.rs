/*!
 * Synchronization Traits
 *
 * Core abstractions for wait/notify patterns.
 *
 * # Design: Trait-Based Abstraction for Conditions
 *
 * Higher-level coordination points (flush completion, durability acks,
 * background task readiness) can depend on `&dyn Condition` instead of a
 * concrete latch.
 */

use super::wait::WaitResult;
use std::time::{Duration, Instant};

/// Result of a wake operation
///
/// Compact representation (single usize) for efficient returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeResult {
    /// Successfully woke N waiters (N >= 1)
    Woken(usize),
    /// No waiters were waiting
    NoWaiters,
}

impl WakeResult {
    pub(crate) fn from_count(count: usize) -> Self {
        if count == 0 {
            WakeResult::NoWaiters
        } else {
            WakeResult::Woken(count)
        }
    }

    /// Check if any waiters were woken
    #[inline(always)]
    pub fn is_woken(&self) -> bool {
        matches!(self, WakeResult::Woken(_))
    }

    /// Get number of woken waiters (0 if none)
    #[inline(always)]
    pub fn count(&self) -> usize {
        match self {
            WakeResult::Woken(n) => *n,
            WakeResult::NoWaiters => 0,
        }
    }
}

/// Condition-variable interface without spurious or lost wakeups
///
/// Implementations must be:
/// - **Thread-safe**: any number of threads may wait and signal concurrently
/// - **Lost-wakeup free**: a signal delivered before a wait starts is observed
/// - **Spurious-wakeup free**: a wait returns only when signaled, timed out,
///   or interrupted
pub trait Condition: Send + Sync {
    /// Block until signaled
    ///
    /// Fails only with `WaitError::Interrupted`.
    fn wait(&self) -> WaitResult<()>;

    /// Block until signaled or `deadline` passes
    ///
    /// Returns `true` if signaled (even when the deadline is already in the
    /// past), `false` on timeout.
    fn wait_until(&self, deadline: Instant) -> WaitResult<bool>;

    /// Block until signaled or `timeout` elapses
    fn wait_for(&self, timeout: Duration) -> WaitResult<bool> {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.wait_until(deadline),
            // Unrepresentable deadline, wait without one
            None => self.wait().map(|()| true),
        }
    }

    /// Wake exactly one waiter
    fn signal(&self) -> WaitResult<()>;

    /// Wake every current waiter
    fn signal_all(&self) -> WakeResult;

    /// Non-blocking check of the condition
    fn is_signaled(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wake_result_from_count() {
        assert_eq!(WakeResult::from_count(0), WakeResult::NoWaiters);
        assert_eq!(WakeResult::from_count(3), WakeResult::Woken(3));
        assert!(!WakeResult::NoWaiters.is_woken());
        assert_eq!(WakeResult::Woken(2).count(), 2);
    }
}
