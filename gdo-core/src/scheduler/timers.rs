//! Named cooperative timers
//!
//! All delayed work in the driver goes through this scheduler: one-shot
//! timeouts and fixed-count retry loops, identified by a key. Scheduling
//! under a key replaces any prior timer with that key, and cancellation
//! is idempotent. Timers fire only when the driver polls between
//! processing steps; the fired payload is plain data the driver
//! interprets.

use gdo_protocol::Command;
use heapless::Vec;

/// Maximum concurrently pending timers
const MAX_TIMERS: usize = 16;

/// Timer identities
///
/// One key per delayed behavior; a new timer under a key implicitly
/// invalidates any pending timer sharing that key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerKey {
    /// Boot settle delay before the first status sync
    SyncSettle,
    /// Bounded status-sync retry loop
    QueryStatusRetry,
    /// Staggered extended-status query within a sync attempt
    QueryExtStatus,
    /// Staggered TTC-duration query within a sync attempt
    QueryTtcDuration,
    /// Staggered openings query within a sync attempt
    QueryOpenings,
    /// Door button release following a press
    ButtonRelease,
    /// Timed stop for move-to-position
    MoveToPosition,
    /// Periodic position estimate refresh while moving
    PositionSync,
    /// Fallback status query after expected arrival
    DoorStatusFallback,
    /// Deferred TTC re-issue after the door closes
    RestoreTtc,
    /// Re-attempt close-with-alert once the door is open
    CloseWithAlert,
}

/// Work carried by a fired timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Task {
    /// Skip the counter ahead and start the status sync
    BeginSync,
    /// One attempt of the status-sync retry loop
    QueryStatusAttempt,
    /// Transmit a command with the given data word
    SendCommand { command: Command, data: u32 },
    /// Transmit the button-release half of a door action
    ReleaseButton { data: u32 },
    /// Issue the timed stop of a move-to-position
    StopDoor,
    /// Refresh the position estimate while the door moves
    PositionSyncTick,
    /// Re-issue the configured TTC after closing
    RestoreTtc,
    /// Retry close-with-alert (door was not yet open)
    CloseWithAlertRetry,
}

/// A timer that has come due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Fired {
    pub key: TimerKey,
    pub task: Task,
    /// Attempts left after this one; always 0 for one-shots, and 0 on
    /// the final attempt of a retry loop
    pub remaining: u8,
}

#[derive(Debug, Clone, Copy)]
struct RetryState {
    remaining: u8,
    interval_ms: u32,
    /// Backoff factor ×10 (15 = 1.5×); 10 keeps the cadence fixed
    backoff_x10: u16,
}

#[derive(Debug, Clone)]
struct Entry {
    key: TimerKey,
    task: Task,
    deadline_ms: u64,
    retry: Option<RetryState>,
}

/// The driver's timer wheel
#[derive(Debug, Default, Clone)]
pub struct Scheduler {
    entries: Vec<Entry, MAX_TIMERS>,
}

impl Scheduler {
    /// Create an empty scheduler
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Arm a one-shot timer, replacing any pending timer under `key`
    pub fn schedule(&mut self, key: TimerKey, task: Task, delay_ms: u64, now_ms: u64) {
        self.cancel(key);
        let _ = self.entries.push(Entry {
            key,
            task,
            deadline_ms: now_ms.saturating_add(delay_ms),
            retry: None,
        });
    }

    /// Arm a retry loop: `attempts` firings, the first after
    /// `interval_ms`, each subsequent interval scaled by
    /// `backoff_x10`/10.
    pub fn schedule_retry(
        &mut self,
        key: TimerKey,
        task: Task,
        interval_ms: u32,
        attempts: u8,
        backoff_x10: u16,
        now_ms: u64,
    ) {
        self.cancel(key);
        if attempts == 0 {
            return;
        }
        let _ = self.entries.push(Entry {
            key,
            task,
            deadline_ms: now_ms.saturating_add(interval_ms as u64),
            retry: Some(RetryState {
                remaining: attempts,
                interval_ms,
                backoff_x10,
            }),
        });
    }

    /// Cancel any timer under `key`; safe to call when none is pending
    pub fn cancel(&mut self, key: TimerKey) {
        self.entries.retain(|e| e.key != key);
    }

    /// Check whether a timer is pending under `key`
    pub fn is_scheduled(&self, key: TimerKey) -> bool {
        self.entries.iter().any(|e| e.key == key)
    }

    /// Pop one due timer, if any.
    ///
    /// Retry entries re-arm themselves with backoff until their attempts
    /// are exhausted; the handler ends a loop early with
    /// [`Scheduler::cancel`]. Call in a loop until `None`.
    pub fn poll(&mut self, now_ms: u64) -> Option<Fired> {
        let idx = self
            .entries
            .iter()
            .position(|e| e.deadline_ms <= now_ms)?;

        let entry = &mut self.entries[idx];
        let key = entry.key;
        let task = entry.task;

        let remaining = match &mut entry.retry {
            Some(retry) => {
                retry.remaining -= 1;
                let remaining = retry.remaining;
                if remaining > 0 {
                    retry.interval_ms =
                        ((retry.interval_ms as u64 * retry.backoff_x10 as u64) / 10) as u32;
                    entry.deadline_ms = now_ms.saturating_add(retry.interval_ms as u64);
                } else {
                    self.entries.swap_remove(idx);
                }
                remaining
            }
            None => {
                self.entries.swap_remove(idx);
                0
            }
        };

        Some(Fired {
            key,
            task,
            remaining,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_shot_fires_once() {
        let mut sched = Scheduler::new();
        sched.schedule(TimerKey::RestoreTtc, Task::RestoreTtc, 100, 0);

        assert!(sched.poll(50).is_none());
        let fired = sched.poll(100).unwrap();
        assert_eq!(fired.key, TimerKey::RestoreTtc);
        assert_eq!(fired.task, Task::RestoreTtc);
        assert_eq!(fired.remaining, 0);
        assert!(sched.poll(200).is_none());
    }

    #[test]
    fn test_reschedule_replaces_prior_same_key() {
        let mut sched = Scheduler::new();
        sched.schedule(TimerKey::DoorStatusFallback, Task::StopDoor, 100, 0);
        sched.schedule(
            TimerKey::DoorStatusFallback,
            Task::PositionSyncTick,
            500,
            0,
        );

        // the first timer is gone
        assert!(sched.poll(100).is_none());
        let fired = sched.poll(500).unwrap();
        assert_eq!(fired.task, Task::PositionSyncTick);
    }

    #[test]
    fn test_cancel_idempotent() {
        let mut sched = Scheduler::new();
        sched.cancel(TimerKey::PositionSync);
        sched.schedule(TimerKey::PositionSync, Task::PositionSyncTick, 10, 0);
        sched.cancel(TimerKey::PositionSync);
        sched.cancel(TimerKey::PositionSync);
        assert!(sched.poll(1000).is_none());
    }

    #[test]
    fn test_retry_backoff_sequence() {
        let mut sched = Scheduler::new();
        // 750 ms start, 1.5x backoff: fires at 750, 1875, 3562, ...
        sched.schedule_retry(
            TimerKey::QueryStatusRetry,
            Task::QueryStatusAttempt,
            750,
            3,
            15,
            0,
        );

        assert!(sched.poll(749).is_none());
        let f1 = sched.poll(750).unwrap();
        assert_eq!(f1.remaining, 2);

        assert!(sched.poll(750 + 1124).is_none());
        let f2 = sched.poll(750 + 1125).unwrap();
        assert_eq!(f2.remaining, 1);

        let f3 = sched.poll(750 + 1125 + 1687).unwrap();
        assert_eq!(f3.remaining, 0);

        // exhausted
        assert!(sched.poll(100_000).is_none());
    }

    #[test]
    fn test_retry_cancel_mid_sequence() {
        let mut sched = Scheduler::new();
        sched.schedule_retry(
            TimerKey::PositionSync,
            Task::PositionSyncTick,
            500,
            10,
            10,
            0,
        );

        assert!(sched.poll(500).is_some());
        assert!(sched.poll(1000).is_some());
        sched.cancel(TimerKey::PositionSync);
        assert!(sched.poll(10_000).is_none());
    }

    #[test]
    fn test_fixed_cadence_retry() {
        let mut sched = Scheduler::new();
        sched.schedule_retry(
            TimerKey::PositionSync,
            Task::PositionSyncTick,
            500,
            4,
            10,
            0,
        );

        for (i, t) in [500u64, 1000, 1500, 2000].iter().enumerate() {
            let fired = sched.poll(*t).unwrap();
            assert_eq!(fired.remaining as usize, 3 - i);
        }
        assert!(sched.poll(9000).is_none());
    }

    #[test]
    fn test_attempt_count_visible() {
        let mut sched = Scheduler::new();
        sched.schedule_retry(
            TimerKey::QueryStatusRetry,
            Task::QueryStatusAttempt,
            10,
            2,
            10,
            0,
        );
        assert_eq!(sched.poll(10).unwrap().remaining, 1);
        assert_eq!(sched.poll(20).unwrap().remaining, 0);
    }
}
