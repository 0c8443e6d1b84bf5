//! Time sources and single-shot timers for Prodash
//!
//! This crate provides the host boundary used by the schedulers:
//! - `Clock`: millisecond time source
//! - `TimerService`: schedule-after-delay / cancel-by-handle
//! - Tokio-backed implementations for production use
//! - `ManualTime`: virtual clock and timer queue for tests and replays

pub mod clock;
pub mod manual;
pub mod tokio_timer;

// Re-exports
pub use clock::{Clock, SystemClock, TokioClock};
pub use manual::ManualTime;
pub use tokio_timer::TokioTimer;

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Deferred work handed to a `TimerService`
pub type TimerTask = Box<dyn FnOnce() + Send + 'static>;

/// Opaque handle to a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
    /// Wrap a raw timer id
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Raw timer id
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Single-shot timer service
///
/// A scheduled task runs exactly once after `delay`, unless cancelled first.
/// Cancelling a handle that already fired (or was already cancelled) is a no-op.
pub trait TimerService: Send + Sync + 'static {
    /// Schedule `task` to run after `delay`
    fn schedule_after(&self, delay: Duration, task: TimerTask) -> TimerHandle;

    /// Cancel a scheduled task
    fn cancel(&self, handle: TimerHandle);
}

/// Errors raised while wiring up a timer host
#[derive(Debug, Error)]
pub enum TimingError {
    /// No tokio runtime is available on the calling thread
    #[error("no tokio runtime is running on this thread")]
    NoRuntime,
}

/// Time source and timer service used together by one scheduler
#[derive(Clone)]
pub struct Host {
    pub clock: Arc<dyn Clock>,
    pub timers: Arc<dyn TimerService>,
}

impl Host {
    /// Combine an arbitrary clock and timer service
    pub fn new(clock: Arc<dyn Clock>, timers: Arc<dyn TimerService>) -> Self {
        Self { clock, timers }
    }

    /// Host backed by the tokio runtime of the calling thread
    ///
    /// Uses `tokio::time`, so paused test time is honoured.
    pub fn tokio() -> Result<Self, TimingError> {
        let timers = TokioTimer::current()?;
        Ok(Self {
            clock: Arc::new(TokioClock::new()),
            timers: Arc::new(timers),
        })
    }

    /// Host driven by a `ManualTime` instance
    pub fn manual(time: &Arc<ManualTime>) -> Self {
        Self {
            clock: time.clone(),
            timers: time.clone(),
        }
    }

    /// Current time in milliseconds
    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host")
            .field("now_ms", &self.clock.now_ms())
            .finish_non_exhaustive()
    }
}
