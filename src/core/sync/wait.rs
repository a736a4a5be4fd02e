/*!
 * Wait Queue
 *
 * Unbounded set of parked waiters with broadcast release.
 *
 * # Design
 *
 * Entries live in a sharded `DashMap` keyed by registration id:
 * - `register` inserts under one shard lock
 * - `signal_all` drains shard by shard, waking every entry it removes
 * - cancellation removes a single entry
 *
 * An entry inserted before a drain reaches its shard is always woken by that
 * drain. The shard lock also orders a registrant's later reads after the
 * drainer's earlier writes, which is what closes the register-then-check race
 * in `SimpleCondition`.
 */

use super::config::SyncConfig;
use super::signal::{Signal, SignalState};
use super::traits::WakeResult;
use ahash::RandomState;
use dashmap::DashMap;
use miette::Diagnostic;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::trace;

/// Result type for wait operations
pub type WaitResult<T> = Result<T, WaitError>;

/// Wait operation errors
///
/// Timeouts are not errors: timed waits report them as `Ok(false)`.
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum WaitError {
    #[error("Wait was interrupted")]
    #[diagnostic(
        code(sync::interrupted),
        help("The waiting thread was interrupted before it was signaled. Retry or abort the operation.")
    )]
    Interrupted,

    #[error("Wait was cancelled")]
    #[diagnostic(
        code(sync::cancelled),
        help("The task running the blocking wait was cancelled or panicked.")
    )]
    Cancelled,

    #[error("Unsupported operation: {0}")]
    #[diagnostic(
        code(sync::unsupported),
        help("Only broadcast release is supported. Use signal_all().")
    )]
    Unsupported(&'static str),
}

/// Entry set shared by a queue and its outstanding signals
pub(crate) struct Waiters {
    entries: DashMap<u64, Arc<SignalState>, RandomState>,
    next_id: AtomicU64,
    config: SyncConfig,
}

impl Waiters {
    fn new(config: SyncConfig) -> Self {
        Self {
            entries: DashMap::with_hasher(RandomState::new()),
            next_id: AtomicU64::new(0),
            config,
        }
    }

    pub(crate) fn remove(&self, id: u64) {
        self.entries.remove(&id);
    }
}

/// Wait queue with cancelable per-waiter handles
///
/// # Examples
///
/// ```
/// use condlatch::WaitQueue;
/// use std::thread;
/// use std::time::Duration;
///
/// let queue = WaitQueue::with_defaults();
/// let signal = queue.register();
///
/// let waiter = thread::spawn(move || signal.wait_for(Duration::from_secs(5)));
///
/// queue.signal_all();
/// assert_eq!(waiter.join().unwrap(), Ok(true));
/// ```
#[derive(Clone)]
pub struct WaitQueue {
    inner: Arc<Waiters>,
}

impl WaitQueue {
    /// Create a new wait queue with the specified configuration
    pub fn new(config: SyncConfig) -> Self {
        Self {
            inner: Arc::new(Waiters::new(config)),
        }
    }

    /// Create with default configuration
    pub fn with_defaults() -> Self {
        Self::new(SyncConfig::default())
    }

    /// Create optimized for low-latency waits
    pub fn low_latency() -> Self {
        Self::new(SyncConfig::low_latency())
    }

    /// Create optimized for long waits
    pub fn long_wait() -> Self {
        Self::new(SyncConfig::long_wait())
    }

    /// Register the caller as a waiter
    ///
    /// Does not block; blocking happens when the returned signal is waited on.
    pub fn register(&self) -> Signal {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let state = Arc::new(SignalState::new());
        self.inner.entries.insert(id, Arc::clone(&state));
        trace!(signal_id = id, "waiter registered");
        Signal::new(id, state, Arc::clone(&self.inner), &self.inner.config)
    }

    /// Wake every currently registered waiter
    ///
    /// Registrations completed before this call are always woken; later ones
    /// are left for a future call. Never blocks on waiters.
    pub fn signal_all(&self) -> WakeResult {
        let mut woken = 0;
        self.inner.entries.retain(|_, state| {
            if state.wake() {
                woken += 1;
            }
            false
        });

        if woken > 0 {
            trace!(woken, "wait queue drained");
        }
        WakeResult::from_count(woken)
    }

    /// Number of live registrations (for diagnostics)
    pub fn waiter_count(&self) -> usize {
        self.inner.entries.len()
    }

    /// Whether any registration is live
    pub fn has_waiters(&self) -> bool {
        !self.inner.entries.is_empty()
    }

    /// Configuration inherited by this queue's signals
    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }
}

impl Default for WaitQueue {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for WaitQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaitQueue")
            .field("waiters", &self.waiter_count())
            .field("config", &self.inner.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sync::Outcome;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn test_wait_queue_basic() {
        let queue = WaitQueue::with_defaults();
        let signal = queue.register();

        let handle = thread::spawn(move || signal.wait_for(Duration::from_secs(1)));

        thread::sleep(Duration::from_millis(50));
        queue.signal_all();

        assert_eq!(handle.join().unwrap(), Ok(true));
    }

    #[test]
    fn test_wait_queue_timeout() {
        let queue = WaitQueue::with_defaults();
        let signal = queue.register();
        let start = Instant::now();

        assert_eq!(signal.wait_for(Duration::from_millis(50)), Ok(false));
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert!(!queue.has_waiters());
    }

    #[test]
    fn test_signal_all() {
        let queue = WaitQueue::with_defaults();

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let signal = queue.register();
                thread::spawn(move || signal.wait_for(Duration::from_secs(1)))
            })
            .collect();

        thread::sleep(Duration::from_millis(100));

        let result = queue.signal_all();
        assert_eq!(result, WakeResult::Woken(3));
        assert_eq!(queue.waiter_count(), 0);

        for handle in handles {
            assert_eq!(handle.join().unwrap(), Ok(true));
        }
    }

    #[test]
    fn test_signal_all_leaves_later_registrations() {
        let queue = WaitQueue::with_defaults();
        let early = queue.register();

        assert_eq!(queue.signal_all(), WakeResult::Woken(1));
        let late = queue.register();

        assert!(early.is_woken());
        assert_eq!(late.outcome(), Outcome::Pending);
        assert_eq!(queue.waiter_count(), 1);

        assert_eq!(queue.signal_all(), WakeResult::Woken(1));
        assert!(late.is_woken());
    }

    #[test]
    fn test_empty_queue_drain() {
        let queue = WaitQueue::default();
        assert_eq!(queue.signal_all(), WakeResult::NoWaiters);
    }

    #[test]
    fn test_cancelled_entries_not_counted() {
        let queue = WaitQueue::with_defaults();
        let kept = queue.register();
        let cancelled = queue.register();

        cancelled.cancel();

        assert_eq!(queue.signal_all(), WakeResult::Woken(1));
        assert!(kept.is_woken());
        assert!(cancelled.is_cancelled());
    }

    #[test]
    fn test_clones_share_entries() {
        let queue = WaitQueue::low_latency();
        let other = queue.clone();
        let signal = other.register();

        assert_eq!(queue.waiter_count(), 1);
        queue.signal_all();
        assert!(signal.is_woken());
    }
}
