//! Power-mode flush policy

use std::time::Duration;

/// Buffer threshold in normal mode, tuned for responsiveness
pub const NORMAL_BUFFER_THRESHOLD: usize = 8 * 1024;
/// Buffer threshold in low-power mode, tuned to minimize wakeups
pub const LOW_POWER_BUFFER_THRESHOLD: usize = 32 * 1024;
/// Background loop wait in normal mode
pub const NORMAL_LOOP_WAIT: Duration = Duration::from_secs(15);
/// Background loop wait in low-power mode
pub const LOW_POWER_LOOP_WAIT: Duration = Duration::from_secs(60);
/// A buffer idle longer than this is drained by the background sweep
pub const IDLE_DRAIN_AFTER: Duration = Duration::from_secs(30);

/// Flush parameters for one power regime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushParams {
    /// Buffer size at which a write triggers an immediate drain
    pub buffer_threshold: usize,
    /// How long the background loop waits between sweeps
    pub loop_wait: Duration,
}

/// Maps the low-power flag to flush parameters
///
/// Pure and idempotent; holds no state beyond the flag passed in.
pub struct PowerModePolicy;

impl PowerModePolicy {
    pub fn params(low_power: bool) -> FlushParams {
        if low_power {
            FlushParams {
                buffer_threshold: LOW_POWER_BUFFER_THRESHOLD,
                loop_wait: LOW_POWER_LOOP_WAIT,
            }
        } else {
            FlushParams {
                buffer_threshold: NORMAL_BUFFER_THRESHOLD,
                loop_wait: NORMAL_LOOP_WAIT,
            }
        }
    }
}
