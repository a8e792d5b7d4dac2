use tracing::debug;

use crate::schedule::{TimerId, TimerSlot};
use crate::stage::{Stage, Tick};

/// Full bar.
pub const TIMEBAR_START: i32 = 342;
const DECREMENT: i32 = 6;
const BASE_INTERVAL_MS: f64 = 500.0;
/// `add` only refills while the bar is below this.
const ADD_GUARD: i32 = 324;
const ADD_SCALE: i32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimebarState {
    Idle,
    Running,
    Expired,
}

/// Round countdown. Runs down from [`TIMEBAR_START`] to zero.
#[derive(Debug)]
pub struct Timebar {
    position: i32,
    state: TimebarState,
    factor: f64,
    slot: TimerSlot,
    visible: bool,
}

impl Default for Timebar {
    fn default() -> Self {
        Self::new()
    }
}

impl Timebar {
    pub fn new() -> Self {
        Self {
            position: TIMEBAR_START,
            state: TimebarState::Idle,
            factor: 1.0,
            slot: TimerSlot::default(),
            visible: false,
        }
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    pub fn state(&self) -> TimebarState {
        self.state
    }

    pub fn times_up(&self) -> bool {
        self.position <= 0
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Start counting down. Higher factors tick faster. Returns true if the
    /// first decrement already ran the bar out.
    pub fn start(&mut self, stage: &mut Stage, factor: f64) -> bool {
        if self.state == TimebarState::Expired {
            return false;
        }
        self.factor = if factor.is_finite() && factor > 0.0 {
            factor
        } else {
            1.0
        };
        self.state = TimebarState::Running;
        self.tick_down(stage)
    }

    fn interval_ms(&self) -> u64 {
        (BASE_INTERVAL_MS / self.factor).round().max(1.0) as u64
    }

    fn tick_down(&mut self, stage: &mut Stage) -> bool {
        self.position -= DECREMENT;
        if self.position <= 0 {
            self.position = 0;
            self.state = TimebarState::Expired;
            self.slot.cancel(&mut stage.scheduler);
            debug!("Times up");
            return true;
        }
        let interval = self.interval_ms();
        self.slot.arm(&mut stage.scheduler, interval, Tick::Timebar);
        false
    }

    /// Handle a timebar tick. Returns true exactly when time runs out.
    pub fn on_tick(&mut self, stage: &mut Stage, id: TimerId) -> bool {
        if !self.slot.fire(id) || self.state != TimebarState::Running {
            return false;
        }
        self.tick_down(stage)
    }

    pub fn pause(&mut self, stage: &mut Stage) {
        self.slot.cancel(&mut stage.scheduler);
        if self.state == TimebarState::Running {
            self.state = TimebarState::Idle;
        }
    }

    pub fn reset(&mut self, stage: &mut Stage) {
        self.slot.cancel(&mut stage.scheduler);
        self.position = TIMEBAR_START;
        self.state = TimebarState::Idle;
    }

    /// Refill by `time × 6`, capped at a full bar. No effect once the bar is
    /// nearly full or has run out.
    pub fn add(&mut self, time: u32) {
        if self.state == TimebarState::Expired || self.position >= ADD_GUARD {
            return;
        }
        let gain = i32::try_from(time).unwrap_or(i32::MAX).saturating_mul(ADD_SCALE);
        self.position = self.position.saturating_add(gain).min(TIMEBAR_START);
    }
}
