/*!
 * Synchronization Configuration
 *
 * Runtime configuration for how a blocked signal waits
 */

use std::time::Duration;

/// Strategy type selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyType {
    /// Park the thread immediately
    Park,
    /// Spin briefly before parking (low-latency, high-CPU for short waits)
    SpinWait,
    /// Auto-select based on available parallelism
    Auto,
}

/// Synchronization configuration
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Preferred strategy
    pub strategy: StrategyType,
    /// Spin duration before parking (for SpinWait)
    pub spin_duration: Duration,
    /// Maximum spin iterations before parking
    pub max_spins: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyType::Auto,
            spin_duration: Duration::from_micros(10),
            max_spins: 100,
        }
    }
}

impl SyncConfig {
    /// Configuration optimized for low-latency (< 1ms wait expected)
    pub const fn low_latency() -> Self {
        Self {
            strategy: StrategyType::SpinWait,
            spin_duration: Duration::from_micros(50),
            max_spins: 500,
        }
    }

    /// Configuration optimized for long waits (flush, durability acks)
    pub const fn long_wait() -> Self {
        Self {
            strategy: StrategyType::Park,
            spin_duration: Duration::from_micros(1),
            max_spins: 10,
        }
    }

    /// Resolve `Auto` to a concrete strategy for this host
    ///
    /// Spinning on a single hardware thread only delays the signaler, so
    /// `Auto` parks there and spins elsewhere.
    pub fn select_strategy(&self) -> StrategyType {
        match self.strategy {
            StrategyType::Auto => {
                let parallelism = std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1);
                if parallelism > 1 {
                    StrategyType::SpinWait
                } else {
                    StrategyType::Park
                }
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_strategy_is_kept() {
        assert_eq!(SyncConfig::long_wait().select_strategy(), StrategyType::Park);
        assert_eq!(
            SyncConfig::low_latency().select_strategy(),
            StrategyType::SpinWait
        );
    }

    #[test]
    fn test_auto_resolves() {
        let resolved = SyncConfig::default().select_strategy();
        assert_ne!(resolved, StrategyType::Auto);
    }
}
