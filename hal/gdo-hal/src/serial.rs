//! Opener serial line abstraction
//!
//! The opener wall-panel bus is a shared, half-duplex, low-speed serial
//! line (9600 baud 8N1 in practice, usually bit-banged). Reads must be
//! non-blocking because the cooperative loop drains whatever bytes have
//! arrived since the last step; writes are synchronous for one
//! fixed-length frame.

/// The shared opener serial line
pub trait SerialLine {
    /// Error type for write operations
    type Error;

    /// Read the next received byte, if one is available.
    ///
    /// Never blocks; the driver calls this in a loop until it returns
    /// `None`.
    fn poll_byte(&mut self) -> Option<u8>;

    /// Write a complete frame to the line.
    ///
    /// Blocks until the last byte is on the wire. Implementations handle
    /// any line conditioning the hardware needs before the first byte
    /// (the wall-panel bus expects a sync break before a frame).
    fn write_frame(&mut self, frame: &[u8]) -> Result<(), Self::Error>;

    /// Sample the receive line for activity.
    ///
    /// Used for collision avoidance before transmitting on the shared
    /// line. Implementations sample the input level over a short bounded
    /// window (~1.3 ms, one byte time) and report whether the other
    /// party is mid-transmission. This is a bounded busy-wait, not a
    /// suspension.
    fn line_busy(&mut self) -> bool;
}
