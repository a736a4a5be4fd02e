/*!
 * Thread Interruption
 *
 * Host-side cancellation for threads blocked on a signal. Every thread owns
 * an interrupt flag; an `InterruptHandle` lets another thread set it and
 * unpark whatever signal the owner is currently blocked on.
 *
 * # Handshake
 *
 * The waiter publishes its parking key and then re-checks the flag inside the
 * park validation callback. The interrupter sets the flag and then reads the
 * key. Both sides use SeqCst, so at least one of them sees the other's write
 * and the interrupt is never lost.
 */

use parking_lot_core::{unpark_all, DEFAULT_UNPARK_TOKEN};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Key value meaning "not parked"
const NOT_PARKED: usize = 0;

#[derive(Debug, Default)]
pub(crate) struct InterruptFlag {
    interrupted: AtomicBool,
    parked_on: AtomicUsize,
}

impl InterruptFlag {
    #[inline]
    pub(crate) fn is_set(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    #[inline]
    pub(crate) fn clear(&self) -> bool {
        self.interrupted.swap(false, Ordering::SeqCst)
    }

    /// Publish the parking key the owner is about to block on
    #[inline]
    pub(crate) fn arm(&self, key: usize) {
        self.parked_on.store(key, Ordering::SeqCst);
    }

    #[inline]
    pub(crate) fn disarm(&self) {
        self.parked_on.store(NOT_PARKED, Ordering::SeqCst);
    }

    fn raise(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
        let key = self.parked_on.load(Ordering::SeqCst);
        if key != NOT_PARKED {
            // SAFETY: unpark_all only touches parking_lot_core's bucket for
            // `key`; a stale key at worst unparks a thread that re-checks its
            // own state and parks again.
            unsafe {
                unpark_all(key, DEFAULT_UNPARK_TOKEN);
            }
        }
    }
}

thread_local! {
    static CURRENT: Arc<InterruptFlag> = Arc::new(InterruptFlag::default());
}

/// Flag of the calling thread
pub(crate) fn current_flag() -> Arc<InterruptFlag> {
    CURRENT.with(Arc::clone)
}

/// Handle used to interrupt a specific thread's blocking waits
///
/// # Examples
///
/// ```
/// use condlatch::{Condition, InterruptHandle, SimpleCondition, WaitError};
/// use std::sync::{mpsc, Arc};
/// use std::thread;
///
/// let cond = Arc::new(SimpleCondition::new());
/// let (tx, rx) = mpsc::channel();
///
/// let waiter = {
///     let cond = cond.clone();
///     thread::spawn(move || {
///         tx.send(InterruptHandle::current()).unwrap();
///         cond.wait()
///     })
/// };
///
/// rx.recv().unwrap().interrupt();
/// assert_eq!(waiter.join().unwrap(), Err(WaitError::Interrupted));
/// ```
#[derive(Debug, Clone)]
pub struct InterruptHandle {
    flag: Arc<InterruptFlag>,
}

impl InterruptHandle {
    /// Handle for the calling thread
    pub fn current() -> Self {
        Self {
            flag: current_flag(),
        }
    }

    /// Interrupt the thread, waking it if it is blocked on a signal
    ///
    /// If the thread is not blocked, its next interruptible wait fails
    /// immediately unless it has already been woken.
    pub fn interrupt(&self) {
        self.flag.raise();
    }

    /// Whether the interrupt flag is currently set
    pub fn is_interrupted(&self) -> bool {
        self.flag.is_set()
    }
}

/// Test and clear the calling thread's interrupt flag
pub fn interrupted() -> bool {
    CURRENT.with(|flag| flag.clear())
}
