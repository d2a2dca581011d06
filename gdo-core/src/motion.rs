//! Door travel model
//!
//! Derives a continuous position estimate from timed door-state
//! transitions and calibrates full-travel durations from clean
//! Closed→Opening→Open (and Open→Closing→Closed) cycles. The estimate is
//! advisory: the driver snaps it to 0/1 the moment a terminal STATUS
//! frame is decoded.
//!
//! Durations are kept in deciseconds; 0 means uncalibrated.

use crate::config::DurationSmoothing;
use crate::state::DoorState;

/// A freshly calibrated travel duration (deciseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DurationUpdate {
    Opening(u16),
    Closing(u16),
}

/// Travel bookkeeping for one door
#[derive(Debug, Clone)]
pub struct DoorTravel {
    opening_duration_ds: u16,
    closing_duration_ds: u16,
    smoothing: DurationSmoothing,
    /// Timestamp when the current move started; `None` = not tracking
    start_moving_ms: Option<u64>,
    /// Position when the current move started
    start_position: Option<f32>,
    /// Signed fraction of full travel remaining when the move started
    move_delta: Option<f32>,
    /// Calibration stopwatch for a clean opening cycle
    opening_started_ms: Option<u64>,
    /// Calibration stopwatch for a clean closing cycle
    closing_started_ms: Option<u64>,
}

impl DoorTravel {
    /// Create a travel model from persisted durations
    pub const fn new(
        opening_duration_ds: u16,
        closing_duration_ds: u16,
        smoothing: DurationSmoothing,
    ) -> Self {
        Self {
            opening_duration_ds,
            closing_duration_ds,
            smoothing,
            start_moving_ms: None,
            start_position: None,
            move_delta: None,
            opening_started_ms: None,
            closing_started_ms: None,
        }
    }

    /// Calibrated opening duration, deciseconds (0 = uncalibrated)
    pub fn opening_duration_ds(&self) -> u16 {
        self.opening_duration_ds
    }

    /// Calibrated closing duration, deciseconds (0 = uncalibrated)
    pub fn closing_duration_ds(&self) -> u16 {
        self.closing_duration_ds
    }

    /// Duration of the travel direction implied by a signed delta
    pub fn duration_for_delta_ds(&self, delta: f32) -> u16 {
        if delta > 0.0 {
            self.opening_duration_ds
        } else {
            self.closing_duration_ds
        }
    }

    /// Feed a door-state transition into the calibration stopwatches.
    ///
    /// A full uninterrupted cycle yields a duration sample rounded to
    /// 0.1 s; Stopped or a reversal breaks the cycle. The sample folds
    /// into the stored estimate per the configured smoothing.
    pub fn calibrate(
        &mut self,
        prev: DoorState,
        next: DoorState,
        now_ms: u64,
    ) -> Option<DurationUpdate> {
        match (prev, next) {
            (DoorState::Closed, DoorState::Opening) => {
                self.opening_started_ms = Some(now_ms);
                self.closing_started_ms = None;
                None
            }
            (DoorState::Open, DoorState::Closing) => {
                self.closing_started_ms = Some(now_ms);
                self.opening_started_ms = None;
                None
            }
            (DoorState::Opening, DoorState::Open) => {
                let started = self.opening_started_ms.take()?;
                let sample = Self::elapsed_ds(started, now_ms);
                self.opening_duration_ds =
                    Self::smooth(self.opening_duration_ds, sample, self.smoothing);
                Some(DurationUpdate::Opening(self.opening_duration_ds))
            }
            (DoorState::Closing, DoorState::Closed) => {
                let started = self.closing_started_ms.take()?;
                let sample = Self::elapsed_ds(started, now_ms);
                self.closing_duration_ds =
                    Self::smooth(self.closing_duration_ds, sample, self.smoothing);
                Some(DurationUpdate::Closing(self.closing_duration_ds))
            }
            // Stop or reversal: the cycle is no longer clean
            (_, DoorState::Stopped)
            | (DoorState::Opening, DoorState::Closing)
            | (DoorState::Closing, DoorState::Opening) => {
                self.opening_started_ms = None;
                self.closing_started_ms = None;
                None
            }
            _ => None,
        }
    }

    /// Elapsed milliseconds rounded to deciseconds
    fn elapsed_ds(started_ms: u64, now_ms: u64) -> u16 {
        let ds = (now_ms.saturating_sub(started_ms) + 50) / 100;
        ds.min(u16::MAX as u64) as u16
    }

    fn smooth(old: u16, sample: u16, mode: DurationSmoothing) -> u16 {
        if old == 0 {
            return sample;
        }
        match mode {
            DurationSmoothing::RunningAverage => ((old as u32 + sample as u32) / 2) as u16,
            DurationSmoothing::Overwrite => sample,
        }
    }

    /// Record the start of a move toward `target`.
    ///
    /// The delta is kept from an earlier `set_move_delta` (partial
    /// moves) unless unknown, in which case it is the full remaining
    /// distance from `current`.
    pub fn begin_move(&mut self, now_ms: u64, current: Option<f32>, target: f32) {
        self.start_moving_ms = Some(now_ms);
        self.start_position = current;
        if self.move_delta.is_none() {
            self.move_delta = current.map(|pos| target - pos);
        }
    }

    /// Fix the signed travel distance (move-to-position)
    pub fn set_move_delta(&mut self, delta: f32) {
        self.move_delta = Some(delta);
    }

    /// Signed travel distance of the current move, if known
    pub fn move_delta(&self) -> Option<f32> {
        self.move_delta
    }

    /// Forget the current move's delta (direction reversal)
    pub fn invalidate_delta(&mut self) {
        self.move_delta = None;
    }

    /// Whether a move is currently being tracked
    pub fn is_tracking(&self) -> bool {
        self.start_moving_ms.is_some()
    }

    /// Drop all movement bookkeeping (calibration stopwatches stay)
    pub fn clear_move(&mut self) {
        self.start_moving_ms = None;
        self.start_position = None;
        self.move_delta = None;
    }

    /// Interpolated position at `now_ms`, clamped to [0, 1].
    ///
    /// `None` while bookkeeping or the relevant duration is missing;
    /// never a value outside the unit interval.
    pub fn estimate(&self, now_ms: u64) -> Option<f32> {
        let started_ms = self.start_moving_ms?;
        let start = self.start_position?;
        let delta = self.move_delta?;
        let duration_ds = self.duration_for_delta_ds(delta);
        if duration_ds == 0 {
            return None;
        }

        let elapsed_ms = now_ms.saturating_sub(started_ms) as f32;
        let signed_duration = if delta > 0.0 {
            duration_ds as f32
        } else {
            -(duration_ds as f32)
        };
        // seconds x10, so 100 ms units
        let position = start + elapsed_ms / (100.0 * signed_duration);
        Some(position.clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn travel() -> DoorTravel {
        DoorTravel::new(0, 0, DurationSmoothing::RunningAverage)
    }

    #[test]
    fn test_opening_calibration() {
        let mut t = travel();
        assert_eq!(t.calibrate(DoorState::Closed, DoorState::Opening, 1_000), None);
        let update = t.calibrate(DoorState::Opening, DoorState::Open, 11_000);
        assert_eq!(update, Some(DurationUpdate::Opening(100))); // 10.0 s
        assert_eq!(t.opening_duration_ds(), 100);
    }

    #[test]
    fn test_closing_calibration() {
        let mut t = travel();
        t.calibrate(DoorState::Open, DoorState::Closing, 0);
        let update = t.calibrate(DoorState::Closing, DoorState::Closed, 11_950);
        assert_eq!(update, Some(DurationUpdate::Closing(120))); // rounded
    }

    #[test]
    fn test_second_cycle_smooths() {
        let mut t = travel();
        t.calibrate(DoorState::Closed, DoorState::Opening, 0);
        t.calibrate(DoorState::Opening, DoorState::Open, 10_000);
        assert_eq!(t.opening_duration_ds(), 100);

        // a 12 s cycle averages in, not overwrites
        t.calibrate(DoorState::Closed, DoorState::Opening, 20_000);
        t.calibrate(DoorState::Opening, DoorState::Open, 32_000);
        assert_eq!(t.opening_duration_ds(), 110);
    }

    #[test]
    fn test_overwrite_mode() {
        let mut t = DoorTravel::new(100, 0, DurationSmoothing::Overwrite);
        t.calibrate(DoorState::Closed, DoorState::Opening, 0);
        t.calibrate(DoorState::Opening, DoorState::Open, 12_000);
        assert_eq!(t.opening_duration_ds(), 120);
    }

    #[test]
    fn test_stop_breaks_cycle() {
        let mut t = travel();
        t.calibrate(DoorState::Closed, DoorState::Opening, 0);
        t.calibrate(DoorState::Opening, DoorState::Stopped, 4_000);
        // resumed move completes, but the cycle was not clean
        assert_eq!(t.calibrate(DoorState::Opening, DoorState::Open, 10_000), None);
        assert_eq!(t.opening_duration_ds(), 0);
    }

    #[test]
    fn test_reversal_breaks_cycle() {
        let mut t = travel();
        t.calibrate(DoorState::Closed, DoorState::Opening, 0);
        t.calibrate(DoorState::Opening, DoorState::Closing, 3_000);
        assert_eq!(t.calibrate(DoorState::Closing, DoorState::Closed, 6_000), None);
    }

    #[test]
    fn test_estimate_while_opening() {
        let mut t = DoorTravel::new(100, 100, DurationSmoothing::RunningAverage);
        t.begin_move(0, Some(0.0), 1.0);
        assert_eq!(t.estimate(5_000), Some(0.5));
        assert_eq!(t.estimate(10_000), Some(1.0));
        // clamped past arrival
        assert_eq!(t.estimate(20_000), Some(1.0));
    }

    #[test]
    fn test_estimate_while_closing() {
        let mut t = DoorTravel::new(100, 100, DurationSmoothing::RunningAverage);
        t.begin_move(0, Some(1.0), 0.0);
        let mid = t.estimate(5_000).unwrap();
        assert!((mid - 0.5).abs() < 1e-6);
        assert_eq!(t.estimate(12_000), Some(0.0));
    }

    #[test]
    fn test_estimate_requires_calibration() {
        let mut t = travel();
        t.begin_move(0, Some(0.0), 1.0);
        assert_eq!(t.estimate(5_000), None);
    }

    #[test]
    fn test_estimate_requires_known_start() {
        let mut t = DoorTravel::new(100, 100, DurationSmoothing::RunningAverage);
        t.begin_move(0, None, 1.0);
        assert_eq!(t.estimate(5_000), None);
    }

    #[test]
    fn test_estimate_always_in_unit_interval() {
        let mut t = DoorTravel::new(50, 80, DurationSmoothing::RunningAverage);
        t.begin_move(0, Some(0.9), 1.0);
        for now in (0..30_000).step_by(500) {
            if let Some(p) = t.estimate(now) {
                assert!((0.0..=1.0).contains(&p));
            }
        }
    }

    #[test]
    fn test_move_starting_at_time_zero_is_tracked() {
        // a monotonic clock legitimately starts at 0
        let mut t = DoorTravel::new(100, 100, DurationSmoothing::RunningAverage);
        t.begin_move(0, Some(0.0), 1.0);
        assert!(t.is_tracking());
        assert_eq!(t.estimate(0), Some(0.0));
        assert_eq!(t.estimate(5_000), Some(0.5));
    }

    #[test]
    fn test_clear_move() {
        let mut t = DoorTravel::new(100, 100, DurationSmoothing::RunningAverage);
        t.begin_move(0, Some(0.0), 1.0);
        assert!(t.is_tracking());
        t.clear_move();
        assert!(!t.is_tracking());
        assert_eq!(t.estimate(5_000), None);
    }
}
