//! Obstruction pulse heuristic
//!
//! The obstruction beam sensor has three observable behaviors on its
//! line: awake and clear (high with a low pulse every ~7 ms), obstructed
//! (steady high), and asleep (steady low). The transitions between awake
//! and asleep are tricky: the voltage drops slowly when falling asleep
//! and is high without pulses while waking up, so a quiet-time threshold
//! separates "just woke up" from "actually obstructed".
//!
//! The edge interrupt is the only writer of [`PulseCounter`]; the
//! cooperative step reads-and-resets it once per sampling window.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::state::ObstructionState;

/// Sampling window length
pub const SAMPLE_PERIOD_MS: u64 = 50;

/// Minimum low pulses per window for a clear verdict
const PULSES_CLEAR_LIMIT: u32 = 3;

/// Steady-high time since the last asleep observation that means an
/// obstruction rather than a wake transition
const QUIET_HIGH_THRESHOLD_MS: u64 = 700;

/// Edge-interrupt pulse accumulator
///
/// The board ISR calls [`PulseCounter::record`] on every falling edge of
/// the sensor line; nothing else may mutate the count outside the
/// interrupt context.
#[derive(Debug, Default)]
pub struct PulseCounter {
    low_count: AtomicU32,
}

impl PulseCounter {
    /// Create a counter at zero
    pub const fn new() -> Self {
        Self {
            low_count: AtomicU32::new(0),
        }
    }

    /// Record one low pulse (ISR context)
    pub fn record(&self) {
        self.low_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Read and reset the accumulated count (cooperative step only)
    pub fn take(&self) -> u32 {
        self.low_count.swap(0, Ordering::Relaxed)
    }
}

/// Windowed pulse-count classifier
///
/// One instance per sensor line; owns its window bookkeeping rather than
/// keeping it in statics.
#[derive(Debug, Clone)]
pub struct ObstructionDetector {
    last_sample_ms: u64,
    last_asleep_ms: u64,
}

impl Default for ObstructionDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl ObstructionDetector {
    /// Create a detector with no history
    pub const fn new() -> Self {
        Self {
            last_sample_ms: 0,
            last_asleep_ms: 0,
        }
    }

    /// Whether a full sampling window has elapsed.
    ///
    /// The caller drains the pulse counter only when this is true, so
    /// pulses keep accumulating across short steps.
    pub fn window_elapsed(&self, now_ms: u64) -> bool {
        now_ms - self.last_sample_ms > SAMPLE_PERIOD_MS
    }

    /// Classify one completed window.
    ///
    /// `pulses` is the drained low-pulse count, `line_high` the current
    /// line level. Returns a verdict only when one can be made:
    /// - >= 3 pulses: the sensor is awake and the beam is clear
    /// - 0 pulses, line low: asleep; record the time, no verdict
    /// - 0 pulses, line high for longer than the quiet threshold:
    ///   obstructed
    /// - anything else: inconclusive (wake transition), no change
    pub fn sample(
        &mut self,
        now_ms: u64,
        pulses: u32,
        line_high: bool,
    ) -> Option<ObstructionState> {
        self.last_sample_ms = now_ms;

        if pulses >= PULSES_CLEAR_LIMIT {
            return Some(ObstructionState::Clear);
        }
        if pulses == 0 {
            if !line_high {
                self.last_asleep_ms = now_ms;
            } else if now_ms - self.last_asleep_ms > QUIET_HIGH_THRESHOLD_MS {
                return Some(ObstructionState::Obstructed);
            }
        }
        None
    }
}
