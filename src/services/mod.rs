//! Host platform services
//! 
//! This module contains the timer and audio collaborators the countdown and
//! the alert are driven by.

pub mod audio;
pub mod rodio_audio;
pub mod timer;

// Re-export main types
pub use audio::{AudioContext, AudioError, AudioService, Envelope, SilentAudio, ToneHandle};
pub use rodio_audio::RodioAudio;
pub use timer::{TimerCallback, TimerHandle, TimerService, TokioTimers};
