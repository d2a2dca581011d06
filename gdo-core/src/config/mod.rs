//! Driver configuration
//!
//! [`types::DriverConfig`] carries per-installation policy; [`persist`]
//! holds the flash-backed state blob (rolling counter and calibrated
//! durations).

pub mod persist;
pub mod types;

pub use persist::{DriverState, STATE_MAGIC, STATE_VERSION};
pub use types::{DriverConfig, DurationSmoothing};
