//! Alert module
//! 
//! This module synthesizes the bell that sounds once the countdown expires.

pub mod synthesizer;

// Re-export main types
pub use synthesizer::{AlertSynthesizer, CHIME_FREQUENCIES, CHIME_REPEAT, CHIME_STAGGER_SECS};
