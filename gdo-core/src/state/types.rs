//! Device state enums
//!
//! Values and encodings match the opener's STATUS nibble and payload
//! bits; toggle helpers exist where the protocol has a toggle
//! sub-action.

/// Door states as reported by the opener STATUS nibble
///
/// Transitions are driven only by decoded STATUS frames, never
/// synthesized locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DoorState {
    Unknown,
    Open,
    Closed,
    Stopped,
    Opening,
    Closing,
}

impl DoorState {
    /// Decode the 4-bit door-state field of a STATUS frame
    pub fn from_nibble(nibble: u8) -> Self {
        match nibble & 0xf {
            1 => DoorState::Open,
            2 => DoorState::Closed,
            3 => DoorState::Stopped,
            4 => DoorState::Opening,
            5 => DoorState::Closing,
            _ => DoorState::Unknown,
        }
    }

    /// Check if the door is currently in motion
    pub fn is_moving(&self) -> bool {
        matches!(self, DoorState::Opening | DoorState::Closing)
    }
}

/// Opener light
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LightState {
    Off,
    On,
    Unknown,
}

impl LightState {
    /// Decode a single payload bit
    pub fn from_bit(bit: u8) -> Self {
        if bit & 1 == 1 {
            LightState::On
        } else {
            LightState::Off
        }
    }

    /// The state after a toggle command
    pub fn toggled(self) -> Self {
        match self {
            LightState::Off => LightState::On,
            LightState::On => LightState::Off,
            LightState::Unknown => LightState::Unknown,
        }
    }
}

/// Remote lockout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LockState {
    Unlocked,
    Locked,
    Unknown,
}

impl LockState {
    /// Decode a single payload bit
    pub fn from_bit(bit: u8) -> Self {
        if bit & 1 == 1 {
            LockState::Locked
        } else {
            LockState::Unlocked
        }
    }

    /// The state after a toggle command
    pub fn toggled(self) -> Self {
        match self {
            LockState::Unlocked => LockState::Locked,
            LockState::Locked => LockState::Unlocked,
            LockState::Unknown => LockState::Unknown,
        }
    }
}

/// Opener motor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorState {
    Off,
    On,
}

/// Wall-button report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonState {
    Released,
    Pressed,
    Unknown,
}

/// Motion sensor report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionState {
    Clear,
    Detected,
}

/// Obstruction beam verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ObstructionState {
    Obstructed,
    Clear,
    /// Sensor asleep or no verdict yet
    Unknown,
}

impl ObstructionState {
    /// Decode the STATUS-frame obstruction bit (0 = obstructed)
    pub fn from_bit(bit: u8) -> Self {
        if bit & 1 == 1 {
            ObstructionState::Clear
        } else {
            ObstructionState::Obstructed
        }
    }
}

/// Time-to-close auto-hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HoldState {
    HoldDisabled,
    HoldEnabled,
    Unknown,
}

impl HoldState {
    /// The state after a toggle command
    pub fn toggled(self) -> Self {
        match self {
            HoldState::HoldDisabled => HoldState::HoldEnabled,
            HoldState::HoldEnabled => HoldState::HoldDisabled,
            HoldState::Unknown => HoldState::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_door_state_nibble() {
        assert_eq!(DoorState::from_nibble(1), DoorState::Open);
        assert_eq!(DoorState::from_nibble(2), DoorState::Closed);
        assert_eq!(DoorState::from_nibble(3), DoorState::Stopped);
        assert_eq!(DoorState::from_nibble(4), DoorState::Opening);
        assert_eq!(DoorState::from_nibble(5), DoorState::Closing);
        assert_eq!(DoorState::from_nibble(0), DoorState::Unknown);
        assert_eq!(DoorState::from_nibble(9), DoorState::Unknown);
        // only the low nibble matters
        assert_eq!(DoorState::from_nibble(0x14), DoorState::Opening);
    }

    #[test]
    fn test_is_moving() {
        assert!(DoorState::Opening.is_moving());
        assert!(DoorState::Closing.is_moving());
        assert!(!DoorState::Open.is_moving());
        assert!(!DoorState::Stopped.is_moving());
    }

    #[test]
    fn test_toggles() {
        assert_eq!(LightState::Off.toggled(), LightState::On);
        assert_eq!(LightState::On.toggled(), LightState::Off);
        assert_eq!(LockState::Unlocked.toggled(), LockState::Locked);
        assert_eq!(HoldState::HoldEnabled.toggled(), HoldState::HoldDisabled);
        assert_eq!(LightState::Unknown.toggled(), LightState::Unknown);
    }

    #[test]
    fn test_obstruction_bit() {
        assert_eq!(ObstructionState::from_bit(0), ObstructionState::Obstructed);
        assert_eq!(ObstructionState::from_bit(1), ObstructionState::Clear);
    }
}
