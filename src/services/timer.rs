//! Periodic timer service

use std::{sync::Arc, time::Duration};
use tokio::{
    runtime::Handle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::debug;

/// Callback invoked on every elapsed period
pub type TimerCallback = Arc<dyn Fn() + Send + Sync + 'static>;

/// Host-side scheduler for repeating callbacks
pub trait TimerService: Send + Sync {
    /// Schedule `callback` to run every `period`, starting one period from now
    fn schedule(&self, period: Duration, callback: TimerCallback) -> TimerHandle;
}

/// Handle to a scheduled timer. Cancelling is idempotent and dropping the
/// handle cancels the timer.
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce() + Send + Sync + 'static>>,
}

impl TimerHandle {
    /// Wrap the cancellation routine of a scheduled timer
    pub fn new<F>(cancel: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Stop the timer. Calling this more than once does nothing.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    /// Check whether the timer is still scheduled
    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerHandle")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Timer service backed by tokio intervals
#[derive(Debug, Clone)]
pub struct TokioTimers {
    runtime: Handle,
}

impl TokioTimers {
    /// Create a timer service on the current tokio runtime.
    ///
    /// Panics when called outside of a runtime, like `tokio::spawn`.
    pub fn new() -> Self {
        Self::with_handle(Handle::current())
    }

    /// Create a timer service on an explicit runtime
    pub fn with_handle(runtime: Handle) -> Self {
        Self { runtime }
    }
}

impl TimerService for TokioTimers {
    fn schedule(&self, period: Duration, callback: TimerCallback) -> TimerHandle {
        debug!("Scheduling timer every {:?}", period);

        let task = self.runtime.spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                callback();
            }
        });

        TimerHandle::new(move || task.abort())
    }
}
