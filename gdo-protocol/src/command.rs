//! Command-code table and payload data words
//!
//! The 12-bit command code selects the operation; the 32-bit data word
//! carries command-specific sub-actions in its low bytes. Codes follow
//! the feature-complete opener variant (TTC and extended-status family
//! included).

/// Wire command codes (12-bit)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum Command {
    Unknown = 0x000,
    GetStatus = 0x080,
    Status = 0x081,
    Obst1 = 0x084,
    Obst2 = 0x085,
    Pair3 = 0x0a0,
    Pair3Resp = 0x0a1,
    GetExtStatus = 0x0a2,
    ExtStatus = 0x0a3,
    Learn = 0x181,
    Lock = 0x18c,
    DoorAction = 0x280,
    Light = 0x281,
    MotorOn = 0x284,
    Motion = 0x285,
    TtcGetDuration = 0x400,
    TtcSetDuration = 0x402,
    TtcDuration = 0x403,
    TtcCancel = 0x408,
    TtcCountdown = 0x40a,
    GetOpenings = 0x48b,
    Openings = 0x48c,
}

impl Command {
    /// The wire code for this command
    pub const fn code(self) -> u16 {
        self as u16
    }

    /// Map a wire code to a command; unrecognized codes are `Unknown`
    pub fn from_code(code: u16) -> Self {
        match code {
            0x080 => Command::GetStatus,
            0x081 => Command::Status,
            0x084 => Command::Obst1,
            0x085 => Command::Obst2,
            0x0a0 => Command::Pair3,
            0x0a1 => Command::Pair3Resp,
            0x0a2 => Command::GetExtStatus,
            0x0a3 => Command::ExtStatus,
            0x181 => Command::Learn,
            0x18c => Command::Lock,
            0x280 => Command::DoorAction,
            0x281 => Command::Light,
            0x284 => Command::MotorOn,
            0x285 => Command::Motion,
            0x400 => Command::TtcGetDuration,
            0x402 => Command::TtcSetDuration,
            0x403 => Command::TtcDuration,
            0x408 => Command::TtcCancel,
            0x40a => Command::TtcCountdown,
            0x48b => Command::GetOpenings,
            0x48c => Command::Openings,
            _ => Command::Unknown,
        }
    }
}

/// Payload data words for transmitted commands
///
/// The driver shifts the data word left by one byte before encoding, so
/// a receiver sees these values in its `nibble` sub-field.
pub mod data {
    pub const DOOR_CLOSE: u32 = 0;
    pub const DOOR_OPEN: u32 = 1;
    pub const DOOR_TOGGLE: u32 = 2;
    pub const DOOR_STOP: u32 = 3;

    /// Button-1 marker bit in a door action word
    pub const DOOR_BUTTON_1: u32 = 1 << 16;
    /// Button press (set) / release (clear) bit in a door action word
    pub const DOOR_PRESS: u32 = 1 << 8;

    pub const LIGHT_OFF: u32 = 0;
    pub const LIGHT_ON: u32 = 1;
    pub const LIGHT_TOGGLE: u32 = 2;

    pub const LOCK_OFF: u32 = 0;
    pub const LOCK_ON: u32 = 1;
    pub const LOCK_TOGGLE: u32 = 2;

    pub const GET_EXT_STATUS: u32 = 0x01;
    pub const TTC_GET_DURATION: u32 = 0x01;

    /// TTC cancel: turn the feature off (receiver byte1 = 0x05)
    pub const TTC_CANCEL_OFF: u32 = 0x0500;
    /// TTC cancel: toggle auto-hold (receiver byte1 = 0x04)
    pub const TTC_CANCEL_TOGGLE_HOLD: u32 = 0x0400;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_roundtrip() {
        let commands = [
            Command::GetStatus,
            Command::Status,
            Command::DoorAction,
            Command::Light,
            Command::Motion,
            Command::TtcDuration,
            Command::Openings,
        ];
        for cmd in commands {
            assert_eq!(Command::from_code(cmd.code()), cmd);
        }
    }

    #[test]
    fn test_unknown_code() {
        assert_eq!(Command::from_code(0xfff), Command::Unknown);
        assert_eq!(Command::from_code(0x082), Command::Unknown);
    }
}
