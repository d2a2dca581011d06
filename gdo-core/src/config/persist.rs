//! Persisted driver state
//!
//! The rolling counter and the calibrated travel durations survive
//! restarts in a small flash blob with a header and CRC. The counter is
//! written on a periodic cadence, not per increment, to bound flash
//! wear; [`crate::counter::MAX_CODES_WITHOUT_FLASH_WRITE`] covers the
//! possible gap.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Magic number to identify valid driver state
pub const STATE_MAGIC: u32 = 0x47444f53; // "GDOS"

/// Current state blob version
pub const STATE_VERSION: u8 = 1;

/// Flash-backed driver state
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DriverState {
    /// Magic number for validation
    pub magic: u32,
    /// Blob format version
    pub version: u8,
    /// Rolling code counter at last save
    pub rolling_counter: u32,
    /// Calibrated opening duration, deciseconds (0 = uncalibrated)
    pub opening_duration_ds: u16,
    /// Calibrated closing duration, deciseconds (0 = uncalibrated)
    pub closing_duration_ds: u16,
    /// CRC32 over magic..durations
    pub crc: u32,
}

impl Default for DriverState {
    fn default() -> Self {
        Self::new()
    }
}

impl DriverState {
    /// Create a fresh state blob (counter 0, nothing calibrated)
    pub const fn new() -> Self {
        Self {
            magic: STATE_MAGIC,
            version: STATE_VERSION,
            rolling_counter: 0,
            opening_duration_ds: 0,
            closing_duration_ds: 0,
            crc: 0,
        }
    }

    /// Check if the blob header is valid (magic and version match)
    pub fn is_valid(&self) -> bool {
        self.magic == STATE_MAGIC && self.version == STATE_VERSION
    }

    /// Calculate CRC32 for the data (excluding the crc field itself)
    pub fn calculate_crc(&self) -> u32 {
        let mut crc: u32 = 0xFFFFFFFF;
        crc = crc32_update(crc, &self.magic.to_le_bytes());
        crc = crc32_update(crc, &[self.version]);
        crc = crc32_update(crc, &self.rolling_counter.to_le_bytes());
        crc = crc32_update(crc, &self.opening_duration_ds.to_le_bytes());
        crc = crc32_update(crc, &self.closing_duration_ds.to_le_bytes());
        !crc
    }

    /// Update the CRC field
    pub fn update_crc(&mut self) {
        self.crc = self.calculate_crc();
    }

    /// Verify the CRC is correct
    pub fn verify_crc(&self) -> bool {
        self.crc == self.calculate_crc()
    }

    /// Serialize to a postcard blob for flash storage
    #[cfg(feature = "serde")]
    pub fn to_bytes<'a>(&self, buffer: &'a mut [u8]) -> Result<&'a mut [u8], postcard::Error> {
        postcard::to_slice(self, buffer)
    }

    /// Deserialize from a postcard blob; `None` on any corruption
    #[cfg(feature = "serde")]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let state: Self = postcard::from_bytes(bytes).ok()?;
        if state.is_valid() && state.verify_crc() {
            Some(state)
        } else {
            None
        }
    }
}

/// Simple CRC32 update function (IEEE 802.3 polynomial)
fn crc32_update(crc: u32, data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB88320;
    let mut crc = crc;

    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }

    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_state_valid() {
        let state = DriverState::new();
        assert!(state.is_valid());
        assert_eq!(state.rolling_counter, 0);
        assert_eq!(state.opening_duration_ds, 0);
    }

    #[test]
    fn test_crc_consistency() {
        let mut state = DriverState::new();
        state.rolling_counter = 0x1234;
        state.opening_duration_ds = 142;
        state.update_crc();

        assert!(state.verify_crc());

        // Modify data without updating CRC
        state.rolling_counter += 1;
        assert!(!state.verify_crc());
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut state = DriverState::new();
        state.magic = 0xdeadbeef;
        assert!(!state.is_valid());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_postcard_roundtrip() {
        let mut state = DriverState::new();
        state.rolling_counter = 4242;
        state.closing_duration_ds = 118;
        state.update_crc();

        let mut buffer = [0u8; 32];
        let bytes = state.to_bytes(&mut buffer).unwrap();
        let restored = DriverState::from_bytes(bytes).unwrap();
        assert_eq!(restored.rolling_counter, 4242);
        assert_eq!(restored.closing_duration_ds, 118);
    }
}
