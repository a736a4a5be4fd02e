/*!
 * Simple Condition
 *
 * One-shot latch without spurious or lost wakeups: a wait that starts after
 * `signal_all` returns immediately, and a wait never returns early unless it
 * times out or is interrupted.
 *
 * # Design
 *
 * - Latched flag checked first, so waits after the event cost one atomic load
 * - Wait queue installed lazily by compare-and-swap (first writer wins)
 * - Waiters register, then re-check the flag before blocking
 * - Signalers set the flag, then drain the queue
 */

use super::config::SyncConfig;
use super::traits::{Condition, WakeResult};
use super::wait::{WaitError, WaitQueue, WaitResult};
use super::Signal;
use crate::monitoring::WaitSpan;
use arc_swap::ArcSwapOption;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// One-shot broadcast latch
///
/// # Examples
///
/// ```
/// use condlatch::{Condition, SimpleCondition};
/// use std::sync::Arc;
/// use std::thread;
///
/// let flushed = Arc::new(SimpleCondition::new());
///
/// let observer = {
///     let flushed = flushed.clone();
///     thread::spawn(move || flushed.wait())
/// };
///
/// flushed.signal_all();
/// assert!(observer.join().unwrap().is_ok());
/// assert!(flushed.is_signaled());
/// ```
pub struct SimpleCondition {
    signaled: AtomicBool,
    waiting: ArcSwapOption<WaitQueue>,
    config: SyncConfig,
}

impl SimpleCondition {
    /// Create an unsignaled condition
    pub fn new() -> Self {
        Self::with_config(SyncConfig::default())
    }

    /// Create an unsignaled condition whose waiters use `config`
    pub fn with_config(config: SyncConfig) -> Self {
        Self {
            signaled: AtomicBool::new(false),
            waiting: ArcSwapOption::empty(),
            config,
        }
    }

    /// Shared queue, installing it on first use
    ///
    /// Concurrent initializers converge on one instance; losers drop theirs.
    fn queue(&self) -> Arc<WaitQueue> {
        if let Some(queue) = self.waiting.load_full() {
            return queue;
        }

        let fresh = Arc::new(WaitQueue::new(self.config.clone()));
        let previous = self
            .waiting
            .compare_and_swap(&None::<Arc<WaitQueue>>, Some(Arc::clone(&fresh)));

        match &*previous {
            Some(winner) => Arc::clone(winner),
            None => {
                debug!("condition wait queue installed");
                fresh
            }
        }
    }

    /// Register on the queue, or `None` if the flag flipped meanwhile
    fn register(&self) -> Option<Signal> {
        let signal = self.queue().register();
        if self.is_signaled() {
            signal.cancel();
            return None;
        }
        Some(signal)
    }

    /// Number of threads currently registered (for diagnostics)
    pub fn waiter_count(&self) -> usize {
        self.waiting
            .load_full()
            .map_or(0, |queue| queue.waiter_count())
    }

    /// Async-compatible wait using tokio::spawn_blocking
    ///
    /// Returns `Ok(true)` once signaled and `Ok(false)` if `timeout` elapses.
    /// Already-signaled conditions return without spawning.
    #[cfg(feature = "tokio")]
    pub async fn wait_async(
        self: &Arc<Self>,
        timeout: Option<std::time::Duration>,
    ) -> WaitResult<bool> {
        if self.is_signaled() {
            return Ok(true);
        }

        let cond = Arc::clone(self);
        tokio::task::spawn_blocking(move || match timeout {
            Some(timeout) => cond.wait_for(timeout),
            None => cond.wait().map(|()| true),
        })
        .await
        .map_err(|_| WaitError::Cancelled)?
    }
}

impl Condition for SimpleCondition {
    fn wait(&self) -> WaitResult<()> {
        if self.is_signaled() {
            return Ok(());
        }

        if let Some(signal) = self.register() {
            let span = WaitSpan::new(signal.id(), None);
            let result = signal.wait();
            span.record_outcome(result.as_ref().map(|_| true));
            result?;
        }

        assert!(
            self.is_signaled(),
            "condition wait returned before the condition was signaled"
        );
        Ok(())
    }

    fn wait_until(&self, deadline: Instant) -> WaitResult<bool> {
        if self.is_signaled() {
            return Ok(true);
        }

        let Some(signal) = self.register() else {
            return Ok(true);
        };

        let span = WaitSpan::new(signal.id(), Some(deadline));
        let result = signal.wait_until(deadline);
        span.record_outcome(result.as_ref().copied());

        Ok(result? || self.is_signaled())
    }

    fn signal(&self) -> WaitResult<()> {
        warn!("single-waiter signal() called on a broadcast-only condition");
        Err(WaitError::Unsupported("signal"))
    }

    fn signal_all(&self) -> WakeResult {
        let first = !self.signaled.swap(true, Ordering::SeqCst);

        match self.waiting.load_full() {
            Some(queue) if first || queue.has_waiters() => queue.signal_all(),
            _ => WakeResult::NoWaiters,
        }
    }

    #[inline]
    fn is_signaled(&self) -> bool {
        self.signaled.load(Ordering::SeqCst)
    }
}

impl Default for SimpleCondition {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SimpleCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleCondition")
            .field("signaled", &self.is_signaled())
            .field("waiters", &self.waiter_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_signal_before_wait() {
        let cond = SimpleCondition::new();
        assert_eq!(cond.signal_all(), WakeResult::NoWaiters);

        assert!(cond.wait().is_ok());
        // Fast path never installs the queue
        assert!(cond.waiting.load_full().is_none());
    }

    #[test]
    fn test_wait_then_signal() {
        let cond = Arc::new(SimpleCondition::new());

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let cond = cond.clone();
                thread::spawn(move || cond.wait())
            })
            .collect();

        thread::sleep(Duration::from_millis(50));
        cond.signal_all();

        for handle in handles {
            assert!(handle.join().unwrap().is_ok());
        }
        assert!(cond.is_signaled());
        assert_eq!(cond.waiter_count(), 0);
    }

    #[test]
    fn test_timed_wait_expires() {
        let cond = SimpleCondition::new();
        let start = Instant::now();

        assert_eq!(cond.wait_for(Duration::from_millis(50)), Ok(false));
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert_eq!(cond.waiter_count(), 0);
    }

    #[test]
    fn test_past_deadline_after_signal() {
        let cond = SimpleCondition::new();
        cond.signal_all();

        let now = Instant::now();
        let past = now.checked_sub(Duration::from_millis(10)).unwrap_or(now);
        assert_eq!(cond.wait_until(past), Ok(true));
    }

    #[test]
    fn test_signal_is_unsupported() {
        let cond = SimpleCondition::new();
        assert_eq!(cond.signal(), Err(WaitError::Unsupported("signal")));
        assert!(!cond.is_signaled());
    }

    #[test]
    fn test_signal_all_idempotent() {
        let cond = SimpleCondition::new();
        let queue = cond.queue();
        let signal = queue.register();

        assert_eq!(cond.signal_all(), WakeResult::Woken(1));
        assert_eq!(cond.signal_all(), WakeResult::NoWaiters);
        assert!(cond.is_signaled());
        assert!(signal.is_woken());
    }

    #[test]
    fn test_queue_installed_once() {
        let cond = Arc::new(SimpleCondition::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cond = cond.clone();
                thread::spawn(move || cond.queue())
            })
            .collect();
        let queues: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();

        for queue in &queues[1..] {
            assert!(Arc::ptr_eq(&queues[0], queue));
        }
    }
}
