//! Main application state management

use std::{
    sync::{Arc, Mutex, Weak},
    time::{Duration, Instant},
};
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::{TickOutcome, TimerState};
use crate::{
    alert::AlertSynthesizer,
    display::TimerView,
    services::{AudioService, TimerHandle, TimerService},
};

/// Countdown cadence
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Everything a transition may touch, guarded by one lock so a state change
/// and the timer it cancels happen together
struct Countdown {
    timer: TimerState,
    tick: Option<TimerHandle>,
    /// Bumped on every tick schedule; callbacks of older schedules are stale
    tick_generation: u64,
    alert: AlertSynthesizer,
}

/// Main application state: the countdown, its tick timer and its alert
pub struct AppState {
    countdown: Mutex<Countdown>,
    timers: Arc<dyn TimerService>,
    this: Weak<AppState>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
    /// Channel for view updates
    pub timer_update_tx: watch::Sender<TimerView>,
    /// Keep the receiver alive to prevent channel closure
    pub _timer_update_rx: watch::Receiver<TimerView>,
}

impl AppState {
    /// Create the application state with an idle countdown of
    /// `configured_minutes` (clamped)
    pub fn new(
        port: u16,
        host: String,
        configured_minutes: i64,
        timers: Arc<dyn TimerService>,
        audio: Arc<dyn AudioService>,
    ) -> Arc<Self> {
        let timer = TimerState::new(configured_minutes);
        let (timer_update_tx, timer_update_rx) = watch::channel(TimerView::from(&timer));
        let alert = AlertSynthesizer::new(audio, Arc::clone(&timers));

        Arc::new_cyclic(|this| Self {
            countdown: Mutex::new(Countdown {
                timer,
                tick: None,
                tick_generation: 0,
                alert,
            }),
            timers,
            this: this.clone(),
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
            timer_update_tx,
            _timer_update_rx: timer_update_rx,
        })
    }

    /// Apply a transition, reconcile the tick timer and alert with the new
    /// phase, then notify view watchers
    fn update_state<F, R>(&self, action: Option<&str>, transition: F) -> Result<(R, TimerView), String>
    where
        F: FnOnce(&mut Countdown) -> R,
    {
        let mut countdown = self.countdown.lock()
            .map_err(|e| format!("Failed to lock countdown: {}", e))?;

        let outcome = transition(&mut countdown);
        self.reconcile(&mut countdown);
        let view = TimerView::from(&countdown.timer);
        drop(countdown); // Release the lock early

        if let Some(action) = action {
            if let Ok(mut last_action) = self.last_action.lock() {
                *last_action = Some(action.to_string());
            }
            if let Ok(mut last_time) = self.last_action_time.lock() {
                *last_time = Some(Utc::now());
            }
        }

        if let Err(e) = self.timer_update_tx.send(view.clone()) {
            warn!("Failed to send timer update: {}", e);
        }

        Ok((outcome, view))
    }

    /// Bring the tick timer and the alert in line with the current phase.
    /// Timers are cancelled before anything new is scheduled.
    fn reconcile(&self, countdown: &mut Countdown) {
        if !countdown.timer.is_running() {
            if let Some(mut tick) = countdown.tick.take() {
                tick.cancel();
                debug!("Countdown tick cancelled");
            }
        }
        if !countdown.timer.is_ringing() && countdown.alert.is_active() {
            countdown.alert.stop();
        }

        if countdown.timer.is_running() && countdown.tick.is_none() {
            countdown.tick_generation += 1;
            let generation = countdown.tick_generation;
            let this = self.this.clone();
            countdown.tick = Some(self.timers.schedule(
                TICK_PERIOD,
                Arc::new(move || {
                    if let Some(state) = this.upgrade() {
                        if let Err(e) = state.scheduled_tick(generation) {
                            error!("Failed to apply countdown tick: {}", e);
                        }
                    }
                }),
            ));
            debug!("Countdown tick scheduled");
        }
        if countdown.timer.is_ringing() && !countdown.alert.is_active() {
            countdown.alert.start();
        }
    }

    /// Set a new duration (clamped to 1..=30 minutes) and go idle, silencing
    /// any alert
    pub fn configure(&self, requested_minutes: i64) -> Result<TimerView, String> {
        info!("Configuring countdown to {} minutes", requested_minutes);
        self.update_state(Some("set"), |c| c.timer.configure(requested_minutes))
            .map(|(_, view)| view)
    }

    /// Start or pause the countdown. Inert while ringing.
    pub fn toggle_run(&self) -> Result<TimerView, String> {
        let (toggled, view) = self.update_state(Some("toggle"), |c| c.timer.toggle_run())?;
        if toggled {
            info!("Countdown {} at {}", if view.running { "started" } else { "paused" }, view.display);
        } else {
            debug!("Toggle ignored while ringing");
        }
        Ok(view)
    }

    /// Restore the configured duration and go idle, silencing any alert
    pub fn reset(&self) -> Result<TimerView, String> {
        info!("Resetting countdown");
        self.update_state(Some("reset"), |c| c.timer.reset())
            .map(|(_, view)| view)
    }

    /// Take one second off a running countdown
    pub fn tick(&self) -> Result<TickOutcome, String> {
        self.apply_tick(None)
    }

    /// Tick from a timer callback. A callback that was already waiting for
    /// the lock when its schedule was cancelled carries an old generation
    /// and is ignored.
    fn scheduled_tick(&self, generation: u64) -> Result<TickOutcome, String> {
        self.apply_tick(Some(generation))
    }

    fn apply_tick(&self, generation: Option<u64>) -> Result<TickOutcome, String> {
        let (outcome, view) = self.update_state(None, |c| match generation {
            Some(generation) if generation != c.tick_generation || c.tick.is_none() => {
                TickOutcome::Ignored
            }
            _ => c.timer.tick(),
        })?;
        match outcome {
            TickOutcome::Expired => info!("Countdown expired, ringing"),
            TickOutcome::Counted => debug!("Tick: {}", view.display),
            TickOutcome::Ignored => debug!("Stale tick ignored"),
        }
        Ok(outcome)
    }

    /// Get the current view
    pub fn get_view(&self) -> Result<TimerView, String> {
        self.countdown.lock()
            .map(|countdown| TimerView::from(&countdown.timer))
            .map_err(|e| format!("Failed to lock countdown: {}", e))
    }

    /// Get a copy of the countdown state
    pub fn get_timer_state(&self) -> Result<TimerState, String> {
        self.countdown.lock()
            .map(|countdown| countdown.timer)
            .map_err(|e| format!("Failed to lock countdown: {}", e))
    }

    /// Check whether the alert currently holds audio resources
    pub fn is_alert_active(&self) -> Result<bool, String> {
        self.countdown.lock()
            .map(|countdown| countdown.alert.is_active())
            .map_err(|e| format!("Failed to lock countdown: {}", e))
    }

    /// Watch view changes
    pub fn subscribe(&self) -> watch::Receiver<TimerView> {
        self.timer_update_tx.subscribe()
    }

    /// Release the tick timer and every audio resource. Called when the
    /// process is torn down.
    pub fn shutdown(&self) {
        let mut countdown = match self.countdown.lock() {
            Ok(countdown) => countdown,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(mut tick) = countdown.tick.take() {
            tick.cancel();
        }
        countdown.alert.stop();
        info!("Countdown timers and audio released");
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("view", &self.get_view().ok())
            .finish()
    }
}
