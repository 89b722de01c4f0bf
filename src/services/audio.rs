//! Audio synthesis service: contexts, tone generators and their envelopes

use std::{f32::consts::PI, time::Instant};
use thiserror::Error;

/// Sample rate used when rendering tones
pub const SAMPLE_RATE: u32 = 44_100;

/// Errors raised by audio backends
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    /// No output device could be opened
    #[error("Audio device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The context was already released
    #[error("Audio context is closed")]
    ContextClosed,

    /// The tone generator was already started
    #[error("Tone generator already started")]
    AlreadyStarted,

    /// The tone generator was already stopped
    #[error("Tone generator already stopped")]
    AlreadyStopped,

    /// The backend failed to play a rendered tone
    #[error("Playback failed: {0}")]
    Playback(String),
}

/// Exponential decay envelope of a single tone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    /// Gain at the tone's start
    pub peak: f32,
    /// Gain approached at the end of the decay
    pub floor: f32,
    /// Seconds from peak to floor
    pub decay_secs: f32,
    /// Seconds after its own start at which the tone terminates
    pub lifetime_secs: f32,
}

impl Envelope {
    /// Bell-like envelope: 0.3 decaying toward 0.001 over 0.8s, silent after 1s
    pub fn bell() -> Self {
        Self {
            peak: 0.3,
            floor: 0.001,
            decay_secs: 0.8,
            lifetime_secs: 1.0,
        }
    }

    /// Gain `t` seconds after the tone started. Holds at `floor` once the
    /// decay has completed, matching an exponential ramp's end value.
    pub fn gain_at(&self, t: f32) -> f32 {
        if t <= 0.0 {
            self.peak
        } else if t >= self.decay_secs {
            self.floor
        } else {
            self.peak * (self.floor / self.peak).powf(t / self.decay_secs)
        }
    }

    /// Render a mono sine wave at `frequency` shaped by this envelope,
    /// preceded by `offset_secs` of silence
    pub fn render(&self, frequency: f32, offset_secs: f32, sample_rate: u32) -> Vec<f32> {
        let rate = sample_rate as f32;
        let silence = (offset_secs.max(0.0) * rate) as usize;
        let voiced = (self.lifetime_secs * rate) as usize;

        let mut samples = vec![0.0; silence];
        samples.reserve(voiced);
        samples.extend((0..voiced).map(|i| {
            let t = i as f32 / rate;
            (t * frequency * 2.0 * PI).sin() * self.gain_at(t)
        }));
        samples
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::bell()
    }
}

/// Factory for audio processing contexts
pub trait AudioService: Send + Sync {
    fn create_context(&self) -> Result<Box<dyn AudioContext>, AudioError>;
}

/// A live audio processing context
pub trait AudioContext: Send {
    /// Create a tone generator. It stays silent until started.
    fn create_tone(
        &mut self,
        frequency: f32,
        envelope: Envelope,
    ) -> Result<Box<dyn ToneHandle>, AudioError>;

    /// Release the context and its output device
    fn release(&mut self) -> Result<(), AudioError>;
}

/// One sine generator with its envelope
pub trait ToneHandle: Send {
    /// Start playback `offset_secs` from now
    fn start(&mut self, offset_secs: f32) -> Result<(), AudioError>;

    /// Terminate playback early
    fn stop(&mut self) -> Result<(), AudioError>;

    /// True once the tone has played out or was stopped
    fn is_finished(&self) -> bool;
}

/// Backend without an output device. Tones only track their own lifetime.
#[derive(Debug, Clone, Default)]
pub struct SilentAudio;

impl AudioService for SilentAudio {
    fn create_context(&self) -> Result<Box<dyn AudioContext>, AudioError> {
        Ok(Box::new(SilentContext { closed: false }))
    }
}

#[derive(Debug)]
struct SilentContext {
    closed: bool,
}

impl AudioContext for SilentContext {
    fn create_tone(
        &mut self,
        _frequency: f32,
        envelope: Envelope,
    ) -> Result<Box<dyn ToneHandle>, AudioError> {
        if self.closed {
            return Err(AudioError::ContextClosed);
        }
        Ok(Box::new(SilentTone {
            envelope,
            ends_at: None,
            stopped: false,
        }))
    }

    fn release(&mut self) -> Result<(), AudioError> {
        if self.closed {
            return Err(AudioError::ContextClosed);
        }
        self.closed = true;
        Ok(())
    }
}

#[derive(Debug)]
struct SilentTone {
    envelope: Envelope,
    ends_at: Option<Instant>,
    stopped: bool,
}

impl ToneHandle for SilentTone {
    fn start(&mut self, offset_secs: f32) -> Result<(), AudioError> {
        if self.ends_at.is_some() {
            return Err(AudioError::AlreadyStarted);
        }
        let span = offset_secs.max(0.0) + self.envelope.lifetime_secs;
        self.ends_at = Some(Instant::now() + std::time::Duration::from_secs_f32(span));
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        if self.stopped {
            return Err(AudioError::AlreadyStopped);
        }
        self.stopped = true;
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.stopped || self.ends_at.is_some_and(|end| Instant::now() >= end)
    }
}
