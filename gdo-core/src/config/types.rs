//! Runtime configuration types
//!
//! The observed protocol variants diverge on a few policies; rather than
//! bless one variant, those policies are configuration here.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How a fresh travel-duration sample folds into the stored estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DurationSmoothing {
    /// Average the new sample with the prior estimate (bounded drift)
    #[default]
    RunningAverage,
    /// Replace the estimate with the new sample
    Overwrite,
}

/// Per-installation driver policy
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DriverConfig {
    /// This node's fixed remote id; frames bearing it are our own echoes
    pub remote_id: u32,
    /// Decode obstruction from STATUS frames instead of the wired sensor
    pub obstruction_from_status: bool,
    /// Sample the shared line before transmitting and defer on activity
    pub collision_avoidance: bool,
    /// Travel-duration calibration policy
    pub smoothing: DurationSmoothing,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            remote_id: 0,
            obstruction_from_status: false,
            collision_avoidance: true,
            smoothing: DurationSmoothing::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = DriverConfig::default();
        assert!(cfg.collision_avoidance);
        assert!(!cfg.obstruction_from_status);
        assert_eq!(cfg.smoothing, DurationSmoothing::RunningAverage);
    }
}
