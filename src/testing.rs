//! Deterministic stand-ins for the timer and audio services used by unit tests

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use crate::services::{
    AudioContext, AudioError, AudioService, Envelope, TimerCallback, TimerHandle, TimerService,
    ToneHandle,
};

struct ScheduledTimer {
    period: Duration,
    callback: TimerCallback,
    active: Arc<AtomicBool>,
}

/// Timer service whose callbacks only run when a test fires them
#[derive(Clone, Default)]
pub struct ManualTimers {
    scheduled: Arc<Mutex<Vec<ScheduledTimer>>>,
}

impl ManualTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Periods of timers that are still scheduled
    pub fn active_periods(&self) -> Vec<Duration> {
        self.scheduled
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.active.load(Ordering::SeqCst))
            .map(|t| t.period)
            .collect()
    }

    /// Run every live timer with the given period once. Returns how many ran.
    pub fn fire(&self, period: Duration) -> usize {
        let due: Vec<(TimerCallback, Arc<AtomicBool>)> = self
            .scheduled
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.period == period && t.active.load(Ordering::SeqCst))
            .map(|t| (Arc::clone(&t.callback), Arc::clone(&t.active)))
            .collect();

        let mut fired = 0;
        for (callback, active) in due {
            if active.load(Ordering::SeqCst) {
                callback();
                fired += 1;
            }
        }
        fired
    }

    /// Run every cancelled timer with the given period once, as if its
    /// callback had already been running when it was cancelled
    pub fn fire_cancelled(&self, period: Duration) -> usize {
        let stale: Vec<TimerCallback> = self
            .scheduled
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.period == period && !t.active.load(Ordering::SeqCst))
            .map(|t| Arc::clone(&t.callback))
            .collect();

        for callback in &stale {
            callback();
        }
        stale.len()
    }
}

impl TimerService for ManualTimers {
    fn schedule(&self, period: Duration, callback: TimerCallback) -> TimerHandle {
        let active = Arc::new(AtomicBool::new(true));
        self.scheduled.lock().unwrap().push(ScheduledTimer {
            period,
            callback,
            active: Arc::clone(&active),
        });
        TimerHandle::new(move || active.store(false, Ordering::SeqCst))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AudioEvent {
    ContextOpened,
    ToneStarted { frequency: f32, offset: f32 },
    ToneStopped,
    StopFailed,
    ContextReleased,
}

#[derive(Default)]
struct Recorder {
    events: Vec<AudioEvent>,
    tones: Vec<Arc<AtomicBool>>,
    fail_device: bool,
    fail_stops: bool,
}

/// Audio service that records every call instead of producing sound
#[derive(Clone, Default)]
pub struct RecordingAudio {
    recorder: Arc<Mutex<Recorder>>,
}

impl RecordingAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AudioEvent> {
        self.recorder.lock().unwrap().events.clone()
    }

    /// Make every following `create_context` fail
    pub fn fail_device(&self) {
        self.recorder.lock().unwrap().fail_device = true;
    }

    /// Make every following tone stop fail, as if the tone had ended itself
    pub fn fail_tone_stops(&self) {
        self.recorder.lock().unwrap().fail_stops = true;
    }

    /// Mark every tone created so far as played out
    pub fn finish_all_tones(&self) {
        for tone in &self.recorder.lock().unwrap().tones {
            tone.store(true, Ordering::SeqCst);
        }
    }

    pub fn contexts_opened(&self) -> usize {
        self.count(|e| matches!(e, AudioEvent::ContextOpened))
    }

    pub fn contexts_released(&self) -> usize {
        self.count(|e| matches!(e, AudioEvent::ContextReleased))
    }

    pub fn stopped_tones(&self) -> usize {
        self.count(|e| matches!(e, AudioEvent::ToneStopped))
    }

    pub fn started_tones(&self) -> Vec<(f32, f32)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                AudioEvent::ToneStarted { frequency, offset } => Some((frequency, offset)),
                _ => None,
            })
            .collect()
    }

    fn count(&self, predicate: impl Fn(&AudioEvent) -> bool) -> usize {
        self.events().iter().filter(|e| predicate(e)).count()
    }
}

impl AudioService for RecordingAudio {
    fn create_context(&self) -> Result<Box<dyn AudioContext>, AudioError> {
        let mut recorder = self.recorder.lock().unwrap();
        if recorder.fail_device {
            return Err(AudioError::DeviceUnavailable("no device in test".to_string()));
        }
        recorder.events.push(AudioEvent::ContextOpened);
        Ok(Box::new(RecordingContext {
            recorder: Arc::clone(&self.recorder),
        }))
    }
}

struct RecordingContext {
    recorder: Arc<Mutex<Recorder>>,
}

impl AudioContext for RecordingContext {
    fn create_tone(
        &mut self,
        frequency: f32,
        _envelope: Envelope,
    ) -> Result<Box<dyn ToneHandle>, AudioError> {
        let finished = Arc::new(AtomicBool::new(false));
        self.recorder
            .lock()
            .unwrap()
            .tones
            .push(Arc::clone(&finished));
        Ok(Box::new(RecordingTone {
            recorder: Arc::clone(&self.recorder),
            frequency,
            finished,
        }))
    }

    fn release(&mut self) -> Result<(), AudioError> {
        self.recorder
            .lock()
            .unwrap()
            .events
            .push(AudioEvent::ContextReleased);
        Ok(())
    }
}

struct RecordingTone {
    recorder: Arc<Mutex<Recorder>>,
    frequency: f32,
    finished: Arc<AtomicBool>,
}

impl ToneHandle for RecordingTone {
    fn start(&mut self, offset_secs: f32) -> Result<(), AudioError> {
        self.recorder.lock().unwrap().events.push(AudioEvent::ToneStarted {
            frequency: self.frequency,
            offset: offset_secs,
        });
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        let mut recorder = self.recorder.lock().unwrap();
        if recorder.fail_stops {
            recorder.events.push(AudioEvent::StopFailed);
            return Err(AudioError::AlreadyStopped);
        }
        recorder.events.push(AudioEvent::ToneStopped);
        self.finished.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}
