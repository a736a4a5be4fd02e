/*!
 * Adaptive Spin Phase
 *
 * Optimized for low-latency scenarios where the signal usually arrives within
 * microseconds. Spins for a bounded budget before the caller parks.
 */

use super::config::{StrategyType, SyncConfig};
use std::thread;
use std::time::{Duration, Instant};

/// Bounded spin budget taken before parking
///
/// # Use Cases
///
/// Best for scenarios where:
/// - Wait duration is typically < 100µs
/// - Low latency is critical
/// - CPU usage is acceptable trade-off
#[derive(Debug, Clone, Copy)]
pub(crate) struct SpinWait {
    /// Spin duration before falling back
    spin_duration: Duration,
    /// Maximum spin iterations
    max_spins: u32,
}

impl SpinWait {
    /// Create a spin phase with an explicit budget
    pub(crate) fn new(spin_duration: Duration, max_spins: u32) -> Self {
        Self {
            spin_duration,
            max_spins,
        }
    }

    /// Spin phase for a configuration, `None` when the strategy parks directly
    pub(crate) fn from_config(config: &SyncConfig) -> Option<Self> {
        match config.select_strategy() {
            StrategyType::SpinWait => Some(Self::new(config.spin_duration, config.max_spins)),
            _ => None,
        }
    }

    /// Spin until `done` returns true or the budget runs out
    ///
    /// Returns true if `done` was observed, false if the caller should park.
    pub(crate) fn spin(&self, deadline: Option<Instant>, done: impl Fn() -> bool) -> bool {
        let start = Instant::now();
        let mut spin_count = 0;

        loop {
            if done() {
                return true;
            }

            let now = Instant::now();
            if now.duration_since(start) >= self.spin_duration || spin_count >= self.max_spins {
                return false;
            }
            if deadline.map_or(false, |d| now >= d) {
                return false;
            }

            // Yield to scheduler occasionally
            if spin_count % 10 == 0 {
                thread::yield_now();
            } else {
                std::hint::spin_loop();
            }

            spin_count += 1;
        }
    }
}
