//! Frame scanning and resynchronization
//!
//! The opener bus delivers bytes in arbitrary small chunks with no framing
//! beyond a fixed 3-byte preamble. [`FrameSynchronizer`] scans the byte
//! stream for the preamble and assembles fixed-length frames, keeping its
//! state across calls so a frame split over many polls is still captured.

/// Total frame length in bytes, preamble included
pub const FRAME_LENGTH: usize = 19;

/// Fixed frame preamble
pub const PREAMBLE: [u8; 3] = [0x55, 0x01, 0x00];

/// A complete wire frame
pub type Frame = [u8; FRAME_LENGTH];

/// Sliding-window preamble value (the three preamble bytes big-endian)
const PREAMBLE_WINDOW: u32 = 0x0055_0100;

/// State machine that finds frames in the inbound byte stream
///
/// While scanning, a 3-byte sliding window is matched against the
/// preamble; any byte that cannot be part of the preamble resets the
/// window. Once the preamble is seen the scanner captures the remaining
/// 16 body bytes unconditionally - mid-frame bytes may take any value.
///
/// One instance per device line; a partial frame persists across calls.
#[derive(Debug, Clone)]
pub struct FrameSynchronizer {
    /// Low 24 bits hold the last three candidate bytes
    window: u32,
    frame: Frame,
    /// Bytes of `frame` filled so far while capturing
    count: usize,
    capturing: bool,
}

impl Default for FrameSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSynchronizer {
    /// Create a new synchronizer in scanning mode
    pub const fn new() -> Self {
        Self {
            window: 0,
            frame: [0; FRAME_LENGTH],
            count: 0,
            capturing: false,
        }
    }

    /// Check whether a frame capture is in progress
    pub fn capturing(&self) -> bool {
        self.capturing
    }

    /// Feed a single byte
    ///
    /// Returns a complete frame when the byte finishes one, `None`
    /// otherwise. No frame shorter than [`FRAME_LENGTH`] is ever emitted.
    pub fn push(&mut self, byte: u8) -> Option<Frame> {
        if self.capturing {
            self.frame[self.count] = byte;
            self.count += 1;
            if self.count == FRAME_LENGTH {
                self.capturing = false;
                self.count = 0;
                self.window = 0;
                return Some(self.frame);
            }
            return None;
        }

        // Scanning: only preamble bytes may stay in the window
        if byte != 0x55 && byte != 0x01 && byte != 0x00 {
            self.window = 0;
            return None;
        }
        self.window = ((self.window << 8) | byte as u32) & 0x00ff_ffff;

        if self.window == PREAMBLE_WINDOW {
            self.frame[..3].copy_from_slice(&PREAMBLE);
            self.count = 3;
            self.capturing = true;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with_body(body: &[u8; 16]) -> [u8; FRAME_LENGTH] {
        let mut f = [0u8; FRAME_LENGTH];
        f[..3].copy_from_slice(&PREAMBLE);
        f[3..].copy_from_slice(body);
        f
    }

    #[test]
    fn test_clean_frame() {
        let mut sync = FrameSynchronizer::new();
        let frame = frame_with_body(&[0xAB; 16]);

        let mut emitted = None;
        for &b in &frame {
            if let Some(f) = sync.push(b) {
                emitted = Some(f);
            }
        }
        assert_eq!(emitted, Some(frame));
        assert!(!sync.capturing());
    }

    #[test]
    fn test_garbage_before_preamble() {
        let mut sync = FrameSynchronizer::new();
        for &b in &[0xFF, 0x12, 0x34, 0x99] {
            assert!(sync.push(b).is_none());
        }

        let frame = frame_with_body(&[0x42; 16]);
        let mut emitted = None;
        for &b in &frame {
            if let Some(f) = sync.push(b) {
                emitted = Some(f);
            }
        }
        assert_eq!(emitted, Some(frame));
    }

    #[test]
    fn test_spurious_partial_preamble() {
        let mut sync = FrameSynchronizer::new();
        // 0x55 0x01 then a non-preamble byte: window must reset, no frame
        assert!(sync.push(0x55).is_none());
        assert!(sync.push(0x01).is_none());
        assert!(sync.push(0x77).is_none());
        assert!(!sync.capturing());

        // A real frame afterwards is still found
        let frame = frame_with_body(&[7; 16]);
        let mut emitted = None;
        for &b in &frame {
            if let Some(f) = sync.push(b) {
                emitted = Some(f);
            }
        }
        assert_eq!(emitted, Some(frame));
    }

    #[test]
    fn test_split_delivery_persists() {
        let mut sync = FrameSynchronizer::new();
        let frame = frame_with_body(&[0x10; 16]);

        // First chunk: preamble plus 5 body bytes
        for &b in &frame[..8] {
            assert!(sync.push(b).is_none());
        }
        assert!(sync.capturing());

        // Second chunk: the rest
        let mut emitted = None;
        for &b in &frame[8..] {
            if let Some(f) = sync.push(b) {
                emitted = Some(f);
            }
        }
        assert_eq!(emitted, Some(frame));
    }

    #[test]
    fn test_body_may_contain_any_bytes() {
        // A body byte equal to 0xFE mid-capture is appended, not filtered
        let mut sync = FrameSynchronizer::new();
        let mut body = [0u8; 16];
        body[0] = 0xFE;
        body[7] = 0x55;
        let frame = frame_with_body(&body);

        let mut emitted = None;
        for &b in &frame {
            if let Some(f) = sync.push(b) {
                emitted = Some(f);
            }
        }
        assert_eq!(emitted, Some(frame));
    }

    #[test]
    fn test_back_to_back_frames() {
        let mut sync = FrameSynchronizer::new();
        let a = frame_with_body(&[1; 16]);
        let b = frame_with_body(&[2; 16]);

        let mut frames = 0;
        for &byte in a.iter().chain(b.iter()) {
            if sync.push(byte).is_some() {
                frames += 1;
            }
        }
        assert_eq!(frames, 2);
    }
}

#[cfg(test)]
mod props {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Every preamble occurrence followed by 16 bytes yields exactly
        /// one full-length frame, regardless of surrounding garbage.
        #[test]
        fn one_frame_per_preamble(
            garbage in proptest::collection::vec(0x02u8..=0xff, 0..32),
            body in proptest::collection::vec(any::<u8>(), 16),
        ) {
            let mut sync = FrameSynchronizer::new();
            let mut frames = 0;

            for &b in &garbage {
                // keep the garbage free of preamble bytes so the count
                // below is exact
                if b != 0x55 && b != 0x01 {
                    if sync.push(b).is_some() {
                        frames += 1;
                    }
                }
            }
            for &b in &PREAMBLE {
                if sync.push(b).is_some() {
                    frames += 1;
                }
            }
            for &b in &body {
                if sync.push(b).is_some() {
                    frames += 1;
                }
            }
            prop_assert_eq!(frames, 1);
        }
    }
}
