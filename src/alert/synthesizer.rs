//! Repeating bell alert

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};
use tracing::{debug, info, warn};

use crate::services::{AudioContext, AudioService, Envelope, TimerHandle, TimerService, ToneHandle};

/// Tones of one chime, in the order they are staggered
pub const CHIME_FREQUENCIES: [f32; 3] = [880.0, 1108.0, 1320.0];
/// Delay between consecutive tones of a chime
pub const CHIME_STAGGER_SECS: f32 = 0.05;
/// Interval between repeated chimes
pub const CHIME_REPEAT: Duration = Duration::from_millis(1_500);

/// Audio resources of one ringing episode
struct Voices {
    context: Box<dyn AudioContext>,
    tones: Vec<Box<dyn ToneHandle>>,
}

impl Voices {
    fn chime(&mut self) {
        // Drop generators that already played out
        self.tones.retain(|tone| !tone.is_finished());

        for (i, frequency) in CHIME_FREQUENCIES.iter().enumerate() {
            let mut tone = match self.context.create_tone(*frequency, Envelope::bell()) {
                Ok(tone) => tone,
                Err(e) => {
                    warn!("Skipping chime: {}", e);
                    return;
                }
            };
            if let Err(e) = tone.start(i as f32 * CHIME_STAGGER_SECS) {
                warn!("Failed to start {}Hz tone: {}", frequency, e);
                continue;
            }
            self.tones.push(tone);
        }
    }

    fn silence(&mut self) {
        for mut tone in self.tones.drain(..) {
            if let Err(e) = tone.stop() {
                debug!("Ignoring tone stop error: {}", e);
            }
        }
        if let Err(e) = self.context.release() {
            debug!("Ignoring context release error: {}", e);
        }
    }
}

struct AlertSession {
    voices: Option<Arc<Mutex<Voices>>>,
    repeat: Option<TimerHandle>,
}

/// Plays a chime immediately and then every [`CHIME_REPEAT`] until stopped.
///
/// The synthesizer exclusively owns the audio context and every tone
/// generator of the current episode. Dropping it stops the alert.
pub struct AlertSynthesizer {
    audio: Arc<dyn AudioService>,
    timers: Arc<dyn TimerService>,
    session: Option<AlertSession>,
}

impl AlertSynthesizer {
    pub fn new(audio: Arc<dyn AudioService>, timers: Arc<dyn TimerService>) -> Self {
        Self {
            audio,
            timers,
            session: None,
        }
    }

    /// Check if an alert episode is in progress
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Number of tone generators that have not yet been released
    pub fn live_tones(&self) -> usize {
        self.session
            .as_ref()
            .and_then(|session| session.voices.as_ref())
            .and_then(|voices| voices.lock().ok().map(|v| v.tones.len()))
            .unwrap_or(0)
    }

    /// Start ringing. Does nothing if already active.
    ///
    /// When no audio context can be opened the episode still counts as active
    /// so the visual alert stays consistent; it is just silent.
    pub fn start(&mut self) {
        if self.session.is_some() {
            debug!("Alert already active, ignoring start");
            return;
        }

        let context = match self.audio.create_context() {
            Ok(context) => context,
            Err(e) => {
                warn!("Ringing without sound: {}", e);
                self.session = Some(AlertSession {
                    voices: None,
                    repeat: None,
                });
                return;
            }
        };

        info!("Starting alert chime");
        let voices = Arc::new(Mutex::new(Voices {
            context,
            tones: Vec::new(),
        }));

        if let Ok(mut v) = voices.lock() {
            v.chime();
        }

        let repeat_voices = Arc::clone(&voices);
        let repeat = self.timers.schedule(
            CHIME_REPEAT,
            Arc::new(move || match repeat_voices.lock() {
                Ok(mut v) => v.chime(),
                Err(e) => warn!("Failed to lock alert voices: {}", e),
            }),
        );

        self.session = Some(AlertSession {
            voices: Some(voices),
            repeat: Some(repeat),
        });
    }

    /// Stop ringing and release every audio resource. Safe to call when
    /// nothing is ringing.
    pub fn stop(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };

        if let Some(mut repeat) = session.repeat.take() {
            repeat.cancel();
        }

        if let Some(voices) = session.voices.take() {
            match voices.lock() {
                Ok(mut v) => v.silence(),
                Err(poisoned) => poisoned.into_inner().silence(),
            }
        }
        info!("Alert stopped");
    }
}

impl Drop for AlertSynthesizer {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for AlertSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertSynthesizer")
            .field("active", &self.is_active())
            .field("live_tones", &self.live_tones())
            .finish()
    }
}
