//! Rolling code counter
//!
//! The anti-replay counter embedded in every transmitted frame. The
//! opener rejects any command whose counter regresses relative to the
//! last value it accepted, so the counter only ever moves forward
//! (mod 2^28). Because the persisted copy is written on a wear-bounded
//! cadence rather than on every increment, an unexpected restart can
//! leave the loaded value behind the opener's; the sync path skips ahead
//! by [`MAX_CODES_WITHOUT_FLASH_WRITE`] to compensate.

use gdo_protocol::codec::ROLLING_MASK;

/// Counter skip-ahead applied at sync time, covering increments that may
/// not have reached flash before a restart
pub const MAX_CODES_WITHOUT_FLASH_WRITE: u32 = 10;

/// The 28-bit rolling code counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RollingCounter(u32);

impl RollingCounter {
    /// Wrap a persisted counter value
    pub const fn new(value: u32) -> Self {
        Self(value & ROLLING_MASK)
    }

    /// Current value
    pub fn get(&self) -> u32 {
        self.0
    }

    /// Advance by one (mod 2^28); called once per transmission
    pub fn increment(&mut self) {
        self.advance(1);
    }

    /// Advance by `delta` (mod 2^28)
    pub fn advance(&mut self, delta: u32) {
        self.0 = self.0.wrapping_add(delta) & ROLLING_MASK;
    }
}
