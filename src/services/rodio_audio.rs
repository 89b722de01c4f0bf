//! Audio backend playing rendered tones on the default output device

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver, RecvTimeoutError, Sender},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};
use rodio::{buffer::SamplesBuffer, OutputStream, Sink};
use tracing::{debug, info, warn};

use super::audio::{AudioContext, AudioError, AudioService, Envelope, ToneHandle, SAMPLE_RATE};

/// How often the output thread drops sinks that have played out
const PRUNE_INTERVAL: Duration = Duration::from_millis(250);

/// Messages to the output thread
#[derive(Debug, Clone, PartialEq)]
enum Command {
    Play {
        id: u64,
        frequency: f32,
        envelope: Envelope,
        offset_secs: f32,
    },
    Stop {
        id: u64,
    },
    Shutdown,
}

/// Audio service opening the system's default output device per context.
///
/// The output stream is not Send, so each context owns a detached thread
/// that opens the device and plays whatever it is told. No call on the
/// context waits for that thread.
#[derive(Debug, Clone)]
pub struct RodioAudio {
    sample_rate: u32,
}

impl RodioAudio {
    pub fn new() -> Self {
        Self { sample_rate: SAMPLE_RATE }
    }
}

impl Default for RodioAudio {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioService for RodioAudio {
    fn create_context(&self) -> Result<Box<dyn AudioContext>, AudioError> {
        let (commands, inbox) = mpsc::channel();
        let device_lost = Arc::new(AtomicBool::new(false));

        let lost = Arc::clone(&device_lost);
        let sample_rate = self.sample_rate;
        // Detached: the thread ends on Shutdown or once every sender is gone
        thread::Builder::new()
            .name("tomato-audio".to_string())
            .spawn(move || run_output(inbox, lost, sample_rate))
            .map_err(|e| AudioError::DeviceUnavailable(e.to_string()))?;

        Ok(Box::new(RodioContext::new(commands, device_lost)))
    }
}

fn run_output(inbox: Receiver<Command>, device_lost: Arc<AtomicBool>, sample_rate: u32) {
    let (_stream, handle) = match OutputStream::try_default() {
        Ok(pair) => pair,
        Err(e) => {
            warn!("Failed to open audio output device: {}", e);
            device_lost.store(true, Ordering::SeqCst);
            return;
        }
    };
    info!("Opened audio output device");

    let mut sinks: HashMap<u64, Sink> = HashMap::new();
    loop {
        match inbox.recv_timeout(PRUNE_INTERVAL) {
            Ok(Command::Play { id, frequency, envelope, offset_secs }) => {
                match Sink::try_new(&handle) {
                    Ok(sink) => {
                        let samples = envelope.render(frequency, offset_secs, sample_rate);
                        sink.append(SamplesBuffer::new(1, sample_rate, samples));
                        sinks.insert(id, sink);
                    }
                    Err(e) => warn!("Failed to play {}Hz tone: {}", frequency, e),
                }
            }
            Ok(Command::Stop { id }) => {
                if let Some(sink) = sinks.remove(&id) {
                    sink.stop();
                }
            }
            Ok(Command::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }
        sinks.retain(|_, sink| !sink.empty());
    }

    for (_, sink) in sinks.drain() {
        sink.stop();
    }
    debug!("Audio output stream closed");
}

struct RodioContext {
    commands: Option<Sender<Command>>,
    device_lost: Arc<AtomicBool>,
    next_id: u64,
}

impl RodioContext {
    fn new(commands: Sender<Command>, device_lost: Arc<AtomicBool>) -> Self {
        Self {
            commands: Some(commands),
            device_lost,
            next_id: 0,
        }
    }
}

impl AudioContext for RodioContext {
    fn create_tone(
        &mut self,
        frequency: f32,
        envelope: Envelope,
    ) -> Result<Box<dyn ToneHandle>, AudioError> {
        let commands = self.commands.as_ref().ok_or(AudioError::ContextClosed)?;
        if self.device_lost.load(Ordering::SeqCst) {
            return Err(AudioError::DeviceUnavailable(
                "output device could not be opened".to_string(),
            ));
        }

        self.next_id += 1;
        Ok(Box::new(RodioTone {
            id: self.next_id,
            commands: commands.clone(),
            frequency,
            envelope,
            ends_at: None,
            stopped: false,
        }))
    }

    fn release(&mut self) -> Result<(), AudioError> {
        let commands = self.commands.take().ok_or(AudioError::ContextClosed)?;
        // The thread may already be gone if the device never opened
        let _ = commands.send(Command::Shutdown);
        Ok(())
    }
}

impl Drop for RodioContext {
    fn drop(&mut self) {
        let _ = self.release();
    }
}

struct RodioTone {
    id: u64,
    commands: Sender<Command>,
    frequency: f32,
    envelope: Envelope,
    ends_at: Option<Instant>,
    stopped: bool,
}

impl ToneHandle for RodioTone {
    fn start(&mut self, offset_secs: f32) -> Result<(), AudioError> {
        if self.ends_at.is_some() {
            return Err(AudioError::AlreadyStarted);
        }
        if self.stopped {
            return Err(AudioError::AlreadyStopped);
        }

        self.commands
            .send(Command::Play {
                id: self.id,
                frequency: self.frequency,
                envelope: self.envelope,
                offset_secs,
            })
            .map_err(|_| AudioError::Playback("audio thread has exited".to_string()))?;

        let span = offset_secs.max(0.0) + self.envelope.lifetime_secs;
        self.ends_at = Some(Instant::now() + Duration::from_secs_f32(span));
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        if self.stopped {
            return Err(AudioError::AlreadyStopped);
        }
        self.stopped = true;
        if self.ends_at.is_some() {
            // Nothing left to silence if the thread is gone
            let _ = self.commands.send(Command::Stop { id: self.id });
        }
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.stopped || self.ends_at.is_some_and(|end| Instant::now() >= end)
    }
}
