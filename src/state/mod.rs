//! State management module
//! 
//! This module contains the countdown state machine and the application state
//! that drives it.

pub mod app_state;
pub mod timer_state;

// Re-export main types
pub use app_state::{AppState, TICK_PERIOD};
pub use timer_state::{
    clamp_minutes, Phase, TickOutcome, TimerState, DEFAULT_MINUTES, MAX_MINUTES, MIN_MINUTES,
};
