/*!
 * Signal
 *
 * Per-waiter registration handle returned by `WaitQueue::register`.
 *
 * # Design
 *
 * Each signal owns a small atomic state word. The word's address doubles as
 * the parking key for parking_lot_core, which maps to futex syscalls on Linux:
 * - Exactly one terminal transition, decided by compare-and-swap
 *   (Pending -> Woken by the queue, Pending -> Cancelled by the owner)
 * - The park validation callback re-checks Pending under the bucket lock, so
 *   an unpark issued after the transition can never be missed
 * - Internal unparks are never reported to the caller; the loop re-checks
 */

use super::config::SyncConfig;
use super::interrupt::{self, InterruptFlag};
use super::spinwait::SpinWait;
use super::wait::{WaitError, WaitResult, Waiters};
use parking_lot_core::{park, unpark_all, DEFAULT_PARK_TOKEN, DEFAULT_UNPARK_TOKEN};
use std::cell::Cell;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

const PENDING: u8 = 0;
const WOKEN: u8 = 1;
const CANCELLED: u8 = 2;

/// Observable state of a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Registered, neither woken nor cancelled
    Pending,
    /// Woken by `signal_all`
    Woken,
    /// Abandoned by its owner (cancel, timeout, interrupt or drop)
    Cancelled,
}

/// Shared state of one registration
///
/// Referenced by the owning `Signal` and by the queue's entry set.
#[repr(C, align(64))] // Cache-line aligned to prevent false sharing
#[derive(Debug)]
pub(crate) struct SignalState {
    state: AtomicU8,
}

impl SignalState {
    pub(crate) const fn new() -> Self {
        Self {
            state: AtomicU8::new(PENDING),
        }
    }

    /// Stable parking address
    #[inline]
    fn key(&self) -> usize {
        &self.state as *const AtomicU8 as usize
    }

    #[inline]
    fn outcome(&self) -> Outcome {
        match self.state.load(Ordering::Acquire) {
            PENDING => Outcome::Pending,
            WOKEN => Outcome::Woken,
            _ => Outcome::Cancelled,
        }
    }

    #[inline]
    fn is_pending(&self) -> bool {
        self.state.load(Ordering::Acquire) == PENDING
    }

    /// Pending -> Woken, unparking the owner
    ///
    /// Returns false if the signal was already terminal.
    pub(crate) fn wake(&self) -> bool {
        if self
            .state
            .compare_exchange(PENDING, WOKEN, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        // SAFETY: the key is the address of a live atomic (the caller holds an
        // Arc to this state) and no parking_lot_core call is made re-entrantly.
        unsafe {
            unpark_all(self.key(), DEFAULT_UNPARK_TOKEN);
        }
        true
    }

    /// Pending -> Cancelled
    ///
    /// Returns the terminal outcome: `Cancelled` if this call won,
    /// `Woken` if a wakeup got there first.
    fn cancel(&self) -> Outcome {
        match self
            .state
            .compare_exchange(PENDING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => Outcome::Cancelled,
            Err(WOKEN) => Outcome::Woken,
            Err(_) => Outcome::Cancelled,
        }
    }
}

/// Registration handle of a single waiter
///
/// Owned exclusively by the thread that registered it: the handle is `Send`
/// but not `Sync`. Dropping a pending signal cancels it.
///
/// # Examples
///
/// ```
/// use condlatch::{Outcome, WaitQueue};
///
/// let queue = WaitQueue::with_defaults();
/// let signal = queue.register();
///
/// queue.signal_all();
///
/// assert!(signal.wait().is_ok());
/// assert_eq!(signal.outcome(), Outcome::Woken);
/// ```
pub struct Signal {
    id: u64,
    state: Arc<SignalState>,
    waiters: Arc<Waiters>,
    spin: Option<SpinWait>,
    _not_sync: PhantomData<Cell<()>>,
}

impl Signal {
    pub(crate) fn new(
        id: u64,
        state: Arc<SignalState>,
        waiters: Arc<Waiters>,
        config: &SyncConfig,
    ) -> Self {
        Self {
            id,
            state,
            waiters,
            spin: SpinWait::from_config(config),
            _not_sync: PhantomData,
        }
    }

    /// Registration id within the owning queue
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Current state, never blocks
    pub fn outcome(&self) -> Outcome {
        self.state.outcome()
    }

    pub fn is_woken(&self) -> bool {
        self.outcome() == Outcome::Woken
    }

    pub fn is_cancelled(&self) -> bool {
        self.outcome() == Outcome::Cancelled
    }

    /// Block until woken or cancelled
    ///
    /// Returns immediately if the signal is already terminal. Fails with
    /// `WaitError::Interrupted` if the thread is interrupted first, in which
    /// case the registration is cancelled.
    pub fn wait(&self) -> WaitResult<()> {
        self.block(None).map(|_| ())
    }

    /// Block until woken or until `deadline`
    ///
    /// Returns `true` if woken (including before this call), `false` on
    /// timeout. A timed-out signal is cancelled and leaves the queue.
    pub fn wait_until(&self, deadline: Instant) -> WaitResult<bool> {
        self.block(Some(deadline))
    }

    /// Block until woken or until `timeout` elapses
    pub fn wait_for(&self, timeout: Duration) -> WaitResult<bool> {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.wait_until(deadline),
            None => self.wait().map(|()| self.is_woken()),
        }
    }

    /// Abandon the registration
    ///
    /// If a wakeup already happened this is a no-op and returns
    /// `Outcome::Woken`; the caller should proceed as if it had waited.
    pub fn cancel(&self) -> Outcome {
        let outcome = self.state.cancel();
        // Woken entries were already drained by the queue
        if outcome == Outcome::Cancelled {
            self.waiters.remove(self.id);
        }
        outcome
    }

    fn block(&self, deadline: Option<Instant>) -> WaitResult<bool> {
        let flag = interrupt::current_flag();

        if let Some(spin) = &self.spin {
            spin.spin(deadline, || !self.state.is_pending() || flag.is_set());
        }

        loop {
            match self.state.outcome() {
                Outcome::Woken => return Ok(true),
                Outcome::Cancelled => return Ok(false),
                Outcome::Pending => {}
            }

            if flag.is_set() {
                return self.on_interrupt(&flag);
            }

            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    return Ok(self.on_timeout());
                }
            }

            self.park(&flag, deadline);
        }
    }

    fn park(&self, flag: &InterruptFlag, deadline: Option<Instant>) {
        let key = self.state.key();
        flag.arm(key);

        // SAFETY: the key is the address of our own live state word; the
        // callbacks neither panic nor call back into parking_lot_core.
        unsafe {
            park(
                key,
                || self.state.is_pending() && !flag.is_set(),
                || {},
                |_, _| {},
                DEFAULT_PARK_TOKEN,
                deadline,
            );
        }

        flag.disarm();
    }

    fn on_timeout(&self) -> bool {
        match self.cancel() {
            Outcome::Woken => true,
            _ => {
                debug!(signal_id = self.id, "wait deadline elapsed");
                false
            }
        }
    }

    fn on_interrupt(&self, flag: &InterruptFlag) -> WaitResult<bool> {
        match self.cancel() {
            // Wakeup won the race; the interrupt stays pending for the
            // thread's next interruptible operation
            Outcome::Woken => Ok(true),
            _ => {
                flag.clear();
                debug!(signal_id = self.id, "wait interrupted");
                Err(WaitError::Interrupted)
            }
        }
    }
}

impl Drop for Signal {
    fn drop(&mut self) {
        if self.state.is_pending() && self.cancel() == Outcome::Cancelled {
            trace!(signal_id = self.id, "pending signal dropped");
        }
    }
}

impl std::fmt::Debug for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.id)
            .field("outcome", &self.outcome())
            .finish()
    }
}
