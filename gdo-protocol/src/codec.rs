//! Wireline cipher boundary
//!
//! The body of every frame is obfuscated by a keyed bit cipher that maps
//! `{rolling counter, fixed id, data word}` to and from the 19-byte wire
//! representation. The cipher's internal bit layout is an interoperability
//! contract with the real hardware and is out of scope here; this module
//! only defines the seam and the decoded field accessors.

use crate::frame::Frame;

/// Mask for the 28-bit rolling counter / remote id space
pub const ROLLING_MASK: u32 = 0x0fff_ffff;

/// Mask clearing the parity nibble of the data word
const PARITY_MASK: u32 = !0xf000;

/// Fields recovered from one wire frame
///
/// `rolling` is the 28-bit anti-replay counter, `fixed` the 40-bit
/// id+command-high word, `data` the 32-bit payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecodedPacket {
    pub rolling: u32,
    pub fixed: u64,
    pub data: u32,
}

impl DecodedPacket {
    /// The 12-bit command code: high nibble from `fixed`, low byte from
    /// `data`.
    pub fn command_code(&self) -> u16 {
        (((self.fixed >> 24) & 0xf00) as u16) | (self.data & 0xff) as u16
    }

    /// The transmitting remote's fixed id
    pub fn remote_id(&self) -> u32 {
        (self.fixed & ROLLING_MASK as u64) as u32
    }

    /// The payload with the parity nibble cleared
    ///
    /// Always interpret payload sub-fields through this value.
    pub fn payload(&self) -> u32 {
        self.data & PARITY_MASK
    }

    /// Command-specific sub-action (low payload byte)
    pub fn nibble(&self) -> u8 {
        (self.payload() >> 8) as u8
    }

    /// Payload byte 2
    pub fn byte1(&self) -> u8 {
        (self.payload() >> 16) as u8
    }

    /// Payload byte 3
    pub fn byte2(&self) -> u8 {
        (self.payload() >> 24) as u8
    }
}

/// Keyed codec between decoded fields and the wire frame
///
/// Implementations must be bit-exact with the opener's cipher; anything
/// else breaks interoperability with real hardware. Tests substitute a
/// plain packing codec.
pub trait WirelineCodec {
    /// Encode one frame from the given counter, fixed id and data word
    fn encode(&self, rolling: u32, fixed: u64, data: u32) -> Frame;

    /// Decode a frame; `None` if the body does not decode cleanly
    fn decode(&self, frame: &Frame) -> Option<DecodedPacket>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_code_derivation() {
        // Command 0x281 (LIGHT): high nibble 0x2 in fixed bits 32..36,
        // low byte 0x81 in data
        let packet = DecodedPacket {
            rolling: 0x123,
            fixed: (0x200u64 << 24) | 0x42,
            data: 0x0000_0181,
        };
        assert_eq!(packet.command_code(), 0x281);
        assert_eq!(packet.remote_id(), 0x42);
    }

    #[test]
    fn test_parity_nibble_cleared() {
        let packet = DecodedPacket {
            rolling: 0,
            fixed: 0,
            data: 0xdead_f281,
        };
        assert_eq!(packet.payload(), 0xdead_0281);
        assert_eq!(packet.nibble(), 0x02);
        assert_eq!(packet.byte1(), 0xad);
        assert_eq!(packet.byte2(), 0xde);
    }
}
