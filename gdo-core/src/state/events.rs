//! Change-notification events
//!
//! One variant per observed field. The driver emits at most one event per
//! field per processing step, carrying the final value.

use super::types::{
    ButtonState, DoorState, HoldState, LightState, LockState, MotionState, MotorState,
    ObstructionState,
};

/// A coalesced field-change notification
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceEvent {
    /// Door state changed
    Door(DoorState),
    /// Door position estimate changed (0.0 closed .. 1.0 open, `None`
    /// while unknown)
    DoorPosition(Option<f32>),
    Light(LightState),
    Lock(LockState),
    Motor(MotorState),
    Button(ButtonState),
    Motion(MotionState),
    Obstruction(ObstructionState),
    Hold(HoldState),
    /// Configured time-to-close in seconds
    TimeToClose(u16),
    /// Lifetime openings count
    Openings(u16),
    /// Calibrated opening duration, deciseconds
    OpeningDuration(u16),
    /// Calibrated closing duration, deciseconds
    ClosingDuration(u16),
    /// Rolling code counter advanced (persist this, on a wear-bounded
    /// cadence)
    RollingCounter(u32),
    /// Status sync exhausted its retry budget (non-fatal; the counter is
    /// the most likely misalignment cause)
    SyncFailed(bool),
    /// The opener reported a TTC duration outside {0, 60, 300, 600}
    InvalidTtc(u16),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_equality() {
        assert_eq!(
            DeviceEvent::Door(DoorState::Open),
            DeviceEvent::Door(DoorState::Open)
        );
        assert_ne!(
            DeviceEvent::Door(DoorState::Open),
            DeviceEvent::Door(DoorState::Closed)
        );
        assert_eq!(
            DeviceEvent::DoorPosition(Some(0.5)),
            DeviceEvent::DoorPosition(Some(0.5))
        );
    }
}
