//! View model of the tomato clock

use serde::{Deserialize, Serialize};

use crate::state::{Phase, TimerState};

/// Render a clock as `MM:SS`, zero-padded
pub fn format_time(minutes: u32, seconds: u32) -> String {
    format!("{:02}:{:02}", minutes, seconds)
}

/// Everything the presentation needs to draw the clock and its controls.
/// Button affordances are derived from the phase, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerView {
    pub display: String,
    pub phase: Phase,
    pub running: bool,
    pub ringing: bool,
    pub minutes_remaining: u32,
    pub seconds_remaining: u32,
    pub configured_minutes: u32,
    pub toggle_label: String,
    pub toggle_enabled: bool,
    pub reset_highlighted: bool,
}

impl From<&TimerState> for TimerView {
    fn from(state: &TimerState) -> Self {
        let ringing = state.is_ringing();
        Self {
            display: format_time(state.minutes_remaining(), state.seconds_remaining()),
            phase: state.phase(),
            running: state.is_running(),
            ringing,
            minutes_remaining: state.minutes_remaining(),
            seconds_remaining: state.seconds_remaining(),
            configured_minutes: state.configured_minutes(),
            toggle_label: if state.is_running() { "Pause" } else { "Start" }.to_string(),
            toggle_enabled: !ringing,
            reset_highlighted: ringing,
        }
    }
}

/// Single terminal status line for the view
pub fn render_line(view: &TimerView) -> String {
    let status = match view.phase {
        Phase::Idle => "paused",
        Phase::Running => "running",
        Phase::Ringing => "time's up! reset to dismiss",
    };
    let bell = if view.ringing { " 🔔" } else { "" };
    format!("🍅 {}{}  [{}]", view.display, bell, status)
}
