//! Countdown state machine

use serde::{Deserialize, Serialize};

/// Shortest configurable duration in minutes
pub const MIN_MINUTES: u32 = 1;
/// Longest configurable duration in minutes
pub const MAX_MINUTES: u32 = 30;
/// Duration used when nothing was configured
pub const DEFAULT_MINUTES: u32 = 25;

/// Clamp a requested duration into the configurable range
pub fn clamp_minutes(requested: i64) -> u32 {
    requested.clamp(MIN_MINUTES as i64, MAX_MINUTES as i64) as u32
}

/// Lifecycle phase of the countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Not counting down and not alerting
    Idle,
    /// Counting down once per second
    Running,
    /// Reached zero; the alert sounds until configure or reset
    Ringing,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Running => "running",
            Phase::Ringing => "ringing",
        }
    }
}

/// Result of a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The countdown was not running
    Ignored,
    /// One second was taken off the remaining time
    Counted,
    /// The countdown was already at zero and has now expired
    Expired,
}

/// Countdown state. Minutes and seconds change together in one transition
/// so a tick never observes half of a rollover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    minutes_remaining: u32,
    seconds_remaining: u32,
    phase: Phase,
    configured_minutes: u32,
}

impl TimerState {
    /// Create an idle countdown of `configured_minutes` (clamped)
    pub fn new(configured_minutes: i64) -> Self {
        let minutes = clamp_minutes(configured_minutes);
        Self {
            minutes_remaining: minutes,
            seconds_remaining: 0,
            phase: Phase::Idle,
            configured_minutes: minutes,
        }
    }

    pub fn minutes_remaining(&self) -> u32 {
        self.minutes_remaining
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    pub fn configured_minutes(&self) -> u32 {
        self.configured_minutes
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn is_ringing(&self) -> bool {
        self.phase == Phase::Ringing
    }

    /// Total seconds left on the clock
    pub fn total_seconds_remaining(&self) -> u32 {
        self.minutes_remaining * 60 + self.seconds_remaining
    }

    /// Set a new duration from any phase. Out-of-range input is clamped.
    pub fn configure(&mut self, requested_minutes: i64) {
        let minutes = clamp_minutes(requested_minutes);
        self.configured_minutes = minutes;
        self.minutes_remaining = minutes;
        self.seconds_remaining = 0;
        self.phase = Phase::Idle;
    }

    /// Start or pause the countdown. Returns false while ringing, when the
    /// toggle has no effect.
    pub fn toggle_run(&mut self) -> bool {
        match self.phase {
            Phase::Idle => {
                self.phase = Phase::Running;
                true
            }
            Phase::Running => {
                self.phase = Phase::Idle;
                true
            }
            Phase::Ringing => false,
        }
    }

    /// Advance the countdown by one second.
    ///
    /// Zero is terminal: a tick at 00:00 expires the countdown instead of
    /// wrapping to 59 seconds.
    pub fn tick(&mut self) -> TickOutcome {
        if self.phase != Phase::Running {
            return TickOutcome::Ignored;
        }

        match (self.minutes_remaining, self.seconds_remaining) {
            (0, 0) => {
                self.phase = Phase::Ringing;
                TickOutcome::Expired
            }
            (minutes, 0) => {
                self.minutes_remaining = minutes - 1;
                self.seconds_remaining = 59;
                TickOutcome::Counted
            }
            (_, seconds) => {
                self.seconds_remaining = seconds - 1;
                TickOutcome::Counted
            }
        }
    }

    /// Restore the configured duration and return to idle from any phase
    pub fn reset(&mut self) {
        self.minutes_remaining = self.configured_minutes;
        self.seconds_remaining = 0;
        self.phase = Phase::Idle;
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new(DEFAULT_MINUTES as i64)
    }
}
