//! Presentation module
//! 
//! This module derives what the clock shows from the countdown state.

pub mod view;

// Re-export main items
pub use view::{format_time, render_line, TimerView};
