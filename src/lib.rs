//! Tomato Timer - a pomodoro countdown with a synthesized bell alert
//! 
//! This library provides the countdown state machine, the repeating chime
//! that sounds when it expires, and an HTTP control surface for both.

pub mod alert;
pub mod api;
pub mod config;
pub mod display;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::Config;
pub use state::AppState;
pub use api::create_router;
pub use utils::signals::shutdown_signal;
