//! Observed device state
//!
//! Every externally visible field of the device model lives here, along
//! with the change-notification machinery.

pub mod events;
pub mod observed;
pub mod types;

pub use events::DeviceEvent;
pub use observed::Observed;
pub use types::{
    ButtonState, DoorState, HoldState, LightState, LockState, MotionState, MotorState,
    ObstructionState,
};
