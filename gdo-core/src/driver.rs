//! The GDO driver
//!
//! [`GdoDriver`] ties the protocol layer to the device model: it drains
//! the serial line through the frame synchronizer, dispatches decoded
//! commands into the observed state, runs the status-sync orchestrator
//! and the obstruction sampler, and transmits outbound commands under
//! the rolling-code discipline.
//!
//! Everything is driven by a single cooperative `poll` call; the board
//! loop calls it as often as it likes with a monotonic millisecond
//! clock. No inbound condition is fatal: malformed frames and unknown
//! commands are dropped, and a failed status sync is reported as an
//! event and nothing more.

use gdo_hal::serial::SerialLine;
use gdo_protocol::codec::{DecodedPacket, WirelineCodec};
use gdo_protocol::command::{data, Command};
use gdo_protocol::frame::{Frame, FrameSynchronizer};
use heapless::Deque;

use crate::config::{DriverConfig, DriverState};
use crate::counter::{RollingCounter, MAX_CODES_WITHOUT_FLASH_WRITE};
use crate::motion::{DoorTravel, DurationUpdate};
use crate::obstruction::{ObstructionDetector, PulseCounter};
use crate::scheduler::{Fired, Scheduler, Task, TimerKey};
use crate::state::{
    ButtonState, DeviceEvent, DoorState, HoldState, LightState, LockState, MotionState,
    MotorState, Observed, ObstructionState,
};

/// Settle delay between boot and the first status sync
const BOOT_SETTLE_MS: u64 = 1000;

/// Status-sync retry loop: start interval, attempt budget, x1.5 backoff
const STATUS_RETRY_INTERVAL_MS: u32 = 750;
const STATUS_RETRY_ATTEMPTS: u8 = 10;
const STATUS_RETRY_BACKOFF_X10: u16 = 15;

/// Stagger between the queries of one sync attempt
const QUERY_STAGGER_MS: u64 = 150;

/// Delay between the press and release halves of a door action
const BUTTON_RELEASE_MS: u64 = 200;

/// Position estimate refresh cadence while the door moves
const POSITION_SYNC_PERIOD_MS: u64 = 500;

/// Margin past expected arrival before the fallback status query
const ARRIVAL_MARGIN_MS: u64 = 1000;

/// Delay before re-issuing a saved TTC once the door has closed
const RESTORE_TTC_DELAY_MS: u64 = 100;

/// Re-check cadence while close-with-alert waits for the door to open
const CLOSE_ALERT_RETRY_MS: u64 = 500;

/// The one-second TTC value doubles as the close-now-with-beeper marker
const TTC_CLOSE_NOW_S: u16 = 1;

/// Query flags: one bit per reply the sync orchestrator waits for
const QSF_STATUS: u8 = 1 << 0;
const QSF_EXT_STATUS: u8 = 1 << 1;
const QSF_TTC_DURATION: u8 = 1 << 2;
const QSF_OPENINGS: u8 = 1 << 3;
const QSF_ALL: u8 = QSF_STATUS | QSF_EXT_STATUS | QSF_TTC_DURATION | QSF_OPENINGS;

/// Coalesced event queue depth
const EVENT_QUEUE: usize = 32;

/// Rolling-code opener driver over one serial line
pub struct GdoDriver<C: WirelineCodec, S: SerialLine> {
    codec: C,
    serial: S,
    config: DriverConfig,

    synchronizer: FrameSynchronizer,
    counter: RollingCounter,
    scheduler: Scheduler,
    travel: DoorTravel,
    detector: ObstructionDetector,

    door: Observed<DoorState>,
    door_position: Observed<Option<f32>>,
    light: Observed<LightState>,
    lock: Observed<LockState>,
    motor: Observed<MotorState>,
    button: Observed<ButtonState>,
    motion: Observed<MotionState>,
    obstruction: Observed<ObstructionState>,
    hold: Observed<HoldState>,
    ttc_seconds: Observed<u16>,
    openings: Observed<u16>,
    opening_duration_ds: Observed<u16>,
    closing_duration_ds: Observed<u16>,
    sync_failed: Observed<bool>,
    last_notified_counter: u32,

    query_flags: u8,
    restore_ttc: bool,
    restore_hold: bool,

    pending_tx: Option<Frame>,
    events: Deque<DeviceEvent, EVENT_QUEUE>,
}

impl<C: WirelineCodec, S: SerialLine> GdoDriver<C, S> {
    /// Build a driver from its transport, policy and persisted state
    pub fn new(codec: C, serial: S, config: DriverConfig, state: DriverState) -> Self {
        let counter = RollingCounter::new(state.rolling_counter);
        Self {
            travel: DoorTravel::new(
                state.opening_duration_ds,
                state.closing_duration_ds,
                config.smoothing,
            ),
            last_notified_counter: counter.get(),
            counter,
            codec,
            serial,
            config,
            synchronizer: FrameSynchronizer::new(),
            scheduler: Scheduler::new(),
            detector: ObstructionDetector::new(),
            door: Observed::new(DoorState::Unknown),
            door_position: Observed::new(None),
            light: Observed::new(LightState::Unknown),
            lock: Observed::new(LockState::Unknown),
            motor: Observed::new(MotorState::Off),
            button: Observed::new(ButtonState::Unknown),
            motion: Observed::new(MotionState::Clear),
            obstruction: Observed::new(ObstructionState::Unknown),
            hold: Observed::new(HoldState::Unknown),
            ttc_seconds: Observed::new(0),
            openings: Observed::new(0),
            opening_duration_ds: Observed::new(state.opening_duration_ds),
            closing_duration_ds: Observed::new(state.closing_duration_ds),
            sync_failed: Observed::new(false),
            query_flags: 0,
            restore_ttc: false,
            restore_hold: false,
            pending_tx: None,
            events: Deque::new(),
        }
    }

    /// Arm the boot settle delay; the first sync runs 1 s later
    pub fn boot(&mut self, now_ms: u64) {
        self.scheduler
            .schedule(TimerKey::SyncSettle, Task::BeginSync, BOOT_SETTLE_MS, now_ms);
    }

    /// One cooperative processing step.
    ///
    /// Flushes any collision-deferred frame, drains received bytes into
    /// the dispatcher, runs the obstruction sampler, fires due timers
    /// and finally emits the coalesced change events for this step.
    pub fn poll(&mut self, now_ms: u64, pulses: &PulseCounter, obstruction_line_high: bool) {
        self.try_transmit();

        while let Some(byte) = self.serial.poll_byte() {
            if let Some(frame) = self.synchronizer.push(byte) {
                self.handle_frame(&frame, now_ms);
            }
        }

        if !self.config.obstruction_from_status && self.detector.window_elapsed(now_ms) {
            if let Some(verdict) =
                self.detector
                    .sample(now_ms, pulses.take(), obstruction_line_high)
            {
                self.obstruction.set(verdict);
            }
        }

        while let Some(fired) = self.scheduler.poll(now_ms) {
            self.handle_task(fired, now_ms);
        }

        self.flush_events();
    }

    /// Pop the next pending change event
    pub fn take_event(&mut self) -> Option<DeviceEvent> {
        self.events.pop_front()
    }

    // ---- status sync orchestrator ----

    /// Skip the counter ahead and start a full status sync.
    ///
    /// The skip covers counter increments that were lost to an
    /// unexpected restart before reaching flash.
    pub fn sync(&mut self, now_ms: u64) {
        self.counter.advance(MAX_CODES_WITHOUT_FLASH_WRITE);
        self.query_status(now_ms);
    }

    /// Query the full device state with a bounded retry loop.
    ///
    /// Each attempt sends GET_STATUS and staggers the extended-status,
    /// TTC-duration and openings queries behind it. The loop ends as
    /// soon as all four replies have arrived; exhausting the attempt
    /// budget raises the sync-failed flag (non-fatal).
    pub fn query_status(&mut self, now_ms: u64) {
        self.query_flags = 0;
        self.scheduler.schedule_retry(
            TimerKey::QueryStatusRetry,
            Task::QueryStatusAttempt,
            STATUS_RETRY_INTERVAL_MS,
            STATUS_RETRY_ATTEMPTS,
            STATUS_RETRY_BACKOFF_X10,
            now_ms,
        );
    }

    /// Refresh the openings count (full sync, the reply rides along)
    pub fn query_openings(&mut self, now_ms: u64) {
        self.query_status(now_ms);
    }

    fn mark_query_flag(&mut self, flag: u8) {
        self.query_flags |= flag;
        if self.query_flags == QSF_ALL {
            self.scheduler.cancel(TimerKey::QueryStatusRetry);
            self.sync_failed.set(false);
        }
    }

    // ---- command surface ----

    /// Press the door button toward Open; no-op while already opening
    pub fn open_door(&mut self, now_ms: u64) -> bool {
        if self.door.get() == DoorState::Opening {
            return false;
        }
        self.door_command(now_ms, data::DOOR_OPEN)
    }

    /// Press the door button toward Close; no-op while the door moves
    pub fn close_door(&mut self, now_ms: u64) -> bool {
        if self.door.get().is_moving() {
            return false;
        }
        self.door_command(now_ms, data::DOOR_CLOSE)
    }

    /// Stop the door mid-travel; no-op unless it is moving
    pub fn stop_door(&mut self, now_ms: u64) -> bool {
        if !self.door.get().is_moving() {
            return false;
        }
        self.door_command(now_ms, data::DOOR_STOP)
    }

    /// Toggle the door; no-op while already opening
    pub fn toggle_door(&mut self, now_ms: u64) -> bool {
        if self.door.get() == DoorState::Opening {
            return false;
        }
        self.door_command(now_ms, data::DOOR_TOGGLE)
    }

    /// Drive the door to a fractional position (0 closed .. 1 open).
    ///
    /// Rejected while the door is moving, when the current position is
    /// unknown, when already within 1% of the target, or before the
    /// needed travel duration has been calibrated. Endpoints delegate to
    /// the plain open/close commands.
    pub fn move_to_position(&mut self, now_ms: u64, target: f32) -> bool {
        if self.door.get().is_moving() {
            return false;
        }
        let target = target.clamp(0.0, 1.0);
        if target <= 0.0 {
            return self.close_door(now_ms);
        }
        if target >= 1.0 {
            return self.open_door(now_ms);
        }
        let Some(current) = self.door_position.get() else {
            return false;
        };
        let delta = target - current;
        if delta.abs() < 0.01 {
            return false;
        }
        let duration_ds = self.travel.duration_for_delta_ds(delta);
        if duration_ds == 0 {
            return false;
        }
        let action = if delta > 0.0 {
            data::DOOR_OPEN
        } else {
            data::DOOR_CLOSE
        };
        if !self.door_command(now_ms, action) {
            return false;
        }
        self.travel.set_move_delta(delta);
        let stop_after_ms = (duration_ds as u64 * 100) as f32 * delta.abs();
        self.scheduler.schedule(
            TimerKey::MoveToPosition,
            Task::StopDoor,
            stop_after_ms as u64,
            now_ms,
        );
        true
    }

    pub fn light_on(&mut self) -> bool {
        if self.send_command(Command::Light, data::LIGHT_ON, true) {
            self.light.set(LightState::On);
            true
        } else {
            false
        }
    }

    pub fn light_off(&mut self) -> bool {
        if self.send_command(Command::Light, data::LIGHT_OFF, true) {
            self.light.set(LightState::Off);
            true
        } else {
            false
        }
    }

    pub fn light_toggle(&mut self) -> bool {
        if self.send_command(Command::Light, data::LIGHT_TOGGLE, true) {
            let next = self.light.get().toggled();
            self.light.set(next);
            true
        } else {
            false
        }
    }

    pub fn lock(&mut self) -> bool {
        if self.send_command(Command::Lock, data::LOCK_ON, true) {
            self.lock.set(LockState::Locked);
            true
        } else {
            false
        }
    }

    pub fn unlock(&mut self) -> bool {
        if self.send_command(Command::Lock, data::LOCK_OFF, true) {
            self.lock.set(LockState::Unlocked);
            true
        } else {
            false
        }
    }

    pub fn lock_toggle(&mut self) -> bool {
        if self.send_command(Command::Lock, data::LOCK_TOGGLE, true) {
            let next = self.lock.get().toggled();
            self.lock.set(next);
            true
        } else {
            false
        }
    }

    /// Toggle the TTC hold-open override (the wire only has a toggle)
    pub fn hold_toggle(&mut self) -> bool {
        if self.send_command(Command::TtcCancel, data::TTC_CANCEL_TOGGLE_HOLD, true) {
            let next = self.hold.get().toggled();
            self.hold.set(next);
            true
        } else {
            false
        }
    }

    pub fn hold_enable(&mut self) -> bool {
        if self.hold.get() == HoldState::HoldEnabled {
            return false;
        }
        self.hold_toggle()
    }

    pub fn hold_disable(&mut self) -> bool {
        if self.hold.get() == HoldState::HoldDisabled {
            return false;
        }
        self.hold_toggle()
    }

    /// Configure the time-to-close duration in seconds
    pub fn set_ttc(&mut self, seconds: u16) -> bool {
        let word = ((seconds as u32 & 0xff) << 16) | (seconds as u32 & 0xff00) | 0x01;
        self.send_command(Command::TtcSetDuration, word, true)
    }

    /// Disable the time-to-close feature
    pub fn turn_ttc_off(&mut self) -> bool {
        self.send_command(Command::TtcCancel, data::TTC_CANCEL_OFF, true)
    }

    /// Close the door with the opener's beeper warning.
    ///
    /// Implemented as a transient one-second TTC from the Open state;
    /// the configured TTC and hold-open override are restored once the
    /// door reports Closed. When the door is not yet open it is opened
    /// first and the alert close re-attempted.
    pub fn close_with_alert(&mut self, now_ms: u64) -> bool {
        match self.door.get() {
            DoorState::Closed => false,
            DoorState::Open => {
                if self.hold.get() == HoldState::HoldEnabled {
                    self.restore_hold = true;
                    self.hold_toggle();
                }
                self.restore_ttc = true;
                self.set_ttc(TTC_CLOSE_NOW_S)
            }
            other => {
                if other != DoorState::Opening {
                    self.open_door(now_ms);
                }
                self.scheduler.schedule(
                    TimerKey::CloseWithAlert,
                    Task::CloseWithAlertRetry,
                    CLOSE_ALERT_RETRY_MS,
                    now_ms,
                );
                true
            }
        }
    }

    // ---- accessors ----

    pub fn door_state(&self) -> DoorState {
        self.door.get()
    }

    pub fn door_position(&self) -> Option<f32> {
        self.door_position.get()
    }

    pub fn light_state(&self) -> LightState {
        self.light.get()
    }

    pub fn lock_state(&self) -> LockState {
        self.lock.get()
    }

    pub fn motor_state(&self) -> MotorState {
        self.motor.get()
    }

    pub fn button_state(&self) -> ButtonState {
        self.button.get()
    }

    pub fn motion_state(&self) -> MotionState {
        self.motion.get()
    }

    pub fn obstruction_state(&self) -> ObstructionState {
        self.obstruction.get()
    }

    pub fn hold_state(&self) -> HoldState {
        self.hold.get()
    }

    pub fn ttc_seconds(&self) -> u16 {
        self.ttc_seconds.get()
    }

    pub fn openings(&self) -> u16 {
        self.openings.get()
    }

    pub fn rolling_counter(&self) -> u32 {
        self.counter.get()
    }

    /// Whether the last status sync completed
    pub fn synced(&self) -> bool {
        self.query_flags == QSF_ALL
    }

    /// Snapshot of the state that belongs in flash, CRC filled in.
    ///
    /// Save on a periodic cadence (or on `RollingCounter` events), not
    /// per increment, to bound flash wear.
    pub fn persist_state(&self) -> DriverState {
        let mut state = DriverState::new();
        state.rolling_counter = self.counter.get();
        state.opening_duration_ds = self.travel.opening_duration_ds();
        state.closing_duration_ds = self.travel.closing_duration_ds();
        state.update_crc();
        state
    }

    /// Direct access to the underlying serial line
    pub fn serial_mut(&mut self) -> &mut S {
        &mut self.serial
    }

    // ---- transmitter ----

    /// Encode and transmit one command.
    ///
    /// A command issued while another frame is still collision-deferred
    /// is dropped; the deferred frame never is.
    fn send_command(&mut self, command: Command, word: u32, increment: bool) -> bool {
        if self.pending_tx.is_some() {
            return false;
        }
        let code = command.code() as u32;
        let fixed = (((code & !0xff) as u64) << 24) | self.config.remote_id as u64;
        let send_data = (word << 8) | (code & 0xff);
        let frame = self.codec.encode(self.counter.get(), fixed, send_data);
        if increment {
            self.counter.increment();
        }
        self.pending_tx = Some(frame);
        self.try_transmit();
        true
    }

    fn try_transmit(&mut self) {
        let Some(frame) = self.pending_tx else {
            return;
        };
        // a busy line defers the frame to the next step
        if self.config.collision_avoidance && self.serial.line_busy() {
            return;
        }
        if self.serial.write_frame(&frame).is_ok() {
            self.pending_tx = None;
        }
    }

    /// Issue a door action as a press/release button pair
    fn door_command(&mut self, now_ms: u64, action: u32) -> bool {
        let word = action | data::DOOR_BUTTON_1 | data::DOOR_PRESS;
        // the press does not consume a code; the release does
        if !self.send_command(Command::DoorAction, word, false) {
            return false;
        }
        self.scheduler.schedule(
            TimerKey::ButtonRelease,
            Task::ReleaseButton {
                data: word & !data::DOOR_PRESS,
            },
            BUTTON_RELEASE_MS,
            now_ms,
        );
        true
    }

    // ---- dispatcher ----

    fn handle_frame(&mut self, frame: &Frame, now_ms: u64) {
        let Some(packet) = self.codec.decode(frame) else {
            return;
        };
        // the shared line echoes our own transmissions back
        if packet.remote_id() == self.config.remote_id {
            return;
        }

        match Command::from_code(packet.command_code()) {
            Command::Status => self.handle_status(&packet, now_ms),
            Command::ExtStatus => self.handle_ext_status(&packet),
            Command::TtcDuration => self.handle_ttc_duration(&packet),
            Command::Openings => self.handle_openings(&packet),
            Command::Light => self.handle_light(&packet),
            Command::Lock => self.handle_lock(&packet),
            Command::DoorAction => {
                let state = if packet.byte1() & 1 == 1 {
                    ButtonState::Pressed
                } else {
                    ButtonState::Released
                };
                self.button.set(state);
            }
            Command::Motion => {
                self.motion.set(MotionState::Detected);
                // motion turns the opener light on; refresh to catch it
                if self.light.get() == LightState::Off {
                    self.send_command(Command::GetStatus, 0, true);
                }
            }
            Command::MotorOn => {
                self.motor.set(MotorState::On);
            }
            _ => {}
        }
    }

    fn handle_status(&mut self, packet: &DecodedPacket, now_ms: u64) {
        let prev = self.door.get();
        let next = DoorState::from_nibble(packet.nibble());

        if let Some(update) = self.travel.calibrate(prev, next, now_ms) {
            match update {
                DurationUpdate::Opening(v) => {
                    self.opening_duration_ds.set(v);
                }
                DurationUpdate::Closing(v) => {
                    self.closing_duration_ds.set(v);
                }
            }
        }
        self.door.set(next);

        match next {
            DoorState::Opening | DoorState::Closing if prev != next => {
                self.begin_motion(next, now_ms);
            }
            DoorState::Open => {
                self.end_motion(Some(1.0));
            }
            DoorState::Closed => {
                self.end_motion(Some(0.0));
                self.scheduler.cancel(TimerKey::CloseWithAlert);
                if self.restore_ttc || self.restore_hold {
                    self.scheduler.schedule(
                        TimerKey::RestoreTtc,
                        Task::RestoreTtc,
                        RESTORE_TTC_DELAY_MS,
                        now_ms,
                    );
                }
                if prev != DoorState::Closed {
                    self.send_command(Command::GetOpenings, 0, true);
                }
            }
            DoorState::Stopped => {
                // final recompute; a still-unknown position snaps to
                // mid-travel
                let snap = match self.travel.estimate(now_ms) {
                    Some(p) => Some(p),
                    None if self.door_position.get().is_none() => Some(0.5),
                    None => None,
                };
                self.end_motion(snap);
            }
            _ => {
                // no estimate to be had here; best-guess mid-travel
                if self.door_position.get().is_none() {
                    self.door_position.set(Some(0.5));
                }
            }
        }

        self.light.set(LightState::from_bit(packet.byte2() >> 1));
        self.lock.set(LockState::from_bit(packet.byte2()));
        if self.config.obstruction_from_status {
            self.obstruction
                .set(ObstructionState::from_bit(packet.byte1() >> 6));
        }
        // STATUS is the only thing that clears these
        self.motion.set(MotionState::Clear);
        self.motor.set(MotorState::Off);

        self.mark_query_flag(QSF_STATUS);
    }

    fn handle_ext_status(&mut self, packet: &DecodedPacket) {
        // TTC operational codes; only the hold-open override and the
        // off marker touch tracked state
        match packet.byte1() {
            0x09 => {
                // TTC switched off entirely
                self.hold.set(HoldState::HoldDisabled);
                self.ttc_seconds.set(0);
            }
            0x0a => {
                self.hold.set(HoldState::HoldEnabled);
            }
            0x01 | 0x0c => {
                self.hold.set(HoldState::HoldDisabled);
            }
            // 0x0b (closing now) and 0x0d/0x0e (close interrupted)
            // leave the override as reported before
            _ => {}
        }
        self.mark_query_flag(QSF_EXT_STATUS);
    }

    fn handle_ttc_duration(&mut self, packet: &DecodedPacket) {
        let seconds = ((packet.byte1() as u16) << 8) | packet.byte2() as u16;
        self.mark_query_flag(QSF_TTC_DURATION);
        if seconds == TTC_CLOSE_NOW_S {
            // transient close-now marker, not a configured duration
            return;
        }
        if matches!(seconds, 0 | 60 | 300 | 600) {
            self.ttc_seconds.set(seconds);
        } else {
            self.push_event(DeviceEvent::InvalidTtc(seconds));
            self.ttc_seconds.set(0);
        }
    }

    fn handle_openings(&mut self, packet: &DecodedPacket) {
        self.mark_query_flag(QSF_OPENINGS);
        // replies triggered by other parties arrive with a nonzero
        // sub-code; trust those only once we hold a count of our own
        if packet.nibble() == 0 || self.openings.get() != 0 {
            let count = ((packet.byte1() as u16) << 8) | packet.byte2() as u16;
            self.openings.set(count);
        }
    }

    fn handle_light(&mut self, packet: &DecodedPacket) {
        let next = match packet.nibble() {
            0 => LightState::Off,
            1 => LightState::On,
            2 => self.light.get().toggled(),
            _ => return,
        };
        self.light.set(next);
    }

    fn handle_lock(&mut self, packet: &DecodedPacket) {
        let next = match packet.nibble() {
            0 => LockState::Unlocked,
            1 => LockState::Locked,
            2 => self.lock.get().toggled(),
            _ => return,
        };
        self.lock.set(next);
    }

    // ---- motion bookkeeping ----

    fn begin_motion(&mut self, next: DoorState, now_ms: u64) {
        let opening = next == DoorState::Opening;
        if let Some(delta) = self.travel.move_delta() {
            // a preset delta only survives if it matches the direction
            if (delta > 0.0) != opening {
                self.travel.invalidate_delta();
            }
        }
        let target = if opening { 1.0 } else { 0.0 };
        self.travel.begin_move(now_ms, self.door_position.get(), target);

        let duration_ds = if opening {
            self.travel.opening_duration_ds()
        } else {
            self.travel.closing_duration_ds()
        };
        if duration_ds == 0 {
            return;
        }
        let full_ms = duration_ds as u64 * 100;
        let travel_ms = match self.travel.move_delta() {
            Some(delta) => (full_ms as f32 * delta.abs().clamp(0.0, 1.0)) as u64,
            None => full_ms,
        };
        let ticks = (travel_ms / POSITION_SYNC_PERIOD_MS).clamp(1, u8::MAX as u64) as u8;
        self.scheduler.schedule_retry(
            TimerKey::PositionSync,
            Task::PositionSyncTick,
            POSITION_SYNC_PERIOD_MS as u32,
            ticks,
            10,
            now_ms,
        );
        self.scheduler.schedule(
            TimerKey::DoorStatusFallback,
            Task::SendCommand {
                command: Command::GetStatus,
                data: 0,
            },
            travel_ms + ARRIVAL_MARGIN_MS,
            now_ms,
        );
    }

    fn end_motion(&mut self, position: Option<f32>) {
        if let Some(p) = position {
            self.door_position.set(Some(p));
        }
        self.travel.clear_move();
        self.scheduler.cancel(TimerKey::PositionSync);
        self.scheduler.cancel(TimerKey::DoorStatusFallback);
        self.scheduler.cancel(TimerKey::MoveToPosition);
    }

    // ---- timer handling ----

    fn handle_task(&mut self, fired: Fired, now_ms: u64) {
        match fired.task {
            Task::BeginSync => self.sync(now_ms),
            Task::QueryStatusAttempt => {
                if self.query_flags == QSF_ALL {
                    self.scheduler.cancel(TimerKey::QueryStatusRetry);
                    return;
                }
                self.send_command(Command::GetStatus, 0, true);
                self.scheduler.schedule(
                    TimerKey::QueryExtStatus,
                    Task::SendCommand {
                        command: Command::GetExtStatus,
                        data: data::GET_EXT_STATUS,
                    },
                    QUERY_STAGGER_MS,
                    now_ms,
                );
                self.scheduler.schedule(
                    TimerKey::QueryTtcDuration,
                    Task::SendCommand {
                        command: Command::TtcGetDuration,
                        data: data::TTC_GET_DURATION,
                    },
                    2 * QUERY_STAGGER_MS,
                    now_ms,
                );
                self.scheduler.schedule(
                    TimerKey::QueryOpenings,
                    Task::SendCommand {
                        command: Command::GetOpenings,
                        data: 0,
                    },
                    3 * QUERY_STAGGER_MS,
                    now_ms,
                );
                if fired.remaining == 0 {
                    self.sync_failed.set(true);
                }
            }
            Task::SendCommand { command, data } => {
                self.send_command(command, data, true);
            }
            Task::ReleaseButton { data } => {
                self.send_command(Command::DoorAction, data, true);
            }
            Task::StopDoor => {
                if self.door.get().is_moving() {
                    self.door_command(now_ms, data::DOOR_STOP);
                }
            }
            Task::PositionSyncTick => {
                if let Some(p) = self.travel.estimate(now_ms) {
                    self.door_position.set(Some(p));
                }
            }
            Task::RestoreTtc => {
                if self.restore_ttc {
                    self.restore_ttc = false;
                    let seconds = self.ttc_seconds.get();
                    if seconds == 0 {
                        self.turn_ttc_off();
                    } else {
                        self.set_ttc(seconds);
                    }
                }
                if self.restore_hold {
                    self.restore_hold = false;
                    self.hold_toggle();
                }
            }
            Task::CloseWithAlertRetry => {
                self.close_with_alert(now_ms);
            }
        }
    }

    // ---- event flush ----

    fn push_event(&mut self, event: DeviceEvent) {
        let _ = self.events.push_back(event);
    }

    fn flush_events(&mut self) {
        if let Some(v) = self.door.take_dirty() {
            self.push_event(DeviceEvent::Door(v));
        }
        if let Some(v) = self.door_position.take_dirty() {
            self.push_event(DeviceEvent::DoorPosition(v));
        }
        if let Some(v) = self.light.take_dirty() {
            self.push_event(DeviceEvent::Light(v));
        }
        if let Some(v) = self.lock.take_dirty() {
            self.push_event(DeviceEvent::Lock(v));
        }
        if let Some(v) = self.motor.take_dirty() {
            self.push_event(DeviceEvent::Motor(v));
        }
        if let Some(v) = self.button.take_dirty() {
            self.push_event(DeviceEvent::Button(v));
        }
        if let Some(v) = self.motion.take_dirty() {
            self.push_event(DeviceEvent::Motion(v));
        }
        if let Some(v) = self.obstruction.take_dirty() {
            self.push_event(DeviceEvent::Obstruction(v));
        }
        if let Some(v) = self.hold.take_dirty() {
            self.push_event(DeviceEvent::Hold(v));
        }
        if let Some(v) = self.ttc_seconds.take_dirty() {
            self.push_event(DeviceEvent::TimeToClose(v));
        }
        if let Some(v) = self.openings.take_dirty() {
            self.push_event(DeviceEvent::Openings(v));
        }
        if let Some(v) = self.opening_duration_ds.take_dirty() {
            self.push_event(DeviceEvent::OpeningDuration(v));
        }
        if let Some(v) = self.closing_duration_ds.take_dirty() {
            self.push_event(DeviceEvent::ClosingDuration(v));
        }
        if let Some(v) = self.sync_failed.take_dirty() {
            self.push_event(DeviceEvent::SyncFailed(v));
        }
        if self.counter.get() != self.last_notified_counter {
            self.last_notified_counter = self.counter.get();
            self.push_event(DeviceEvent::RollingCounter(self.last_notified_counter));
        }
    }
}
