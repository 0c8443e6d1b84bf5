//! Millisecond time sources

use std::time::{SystemTime, UNIX_EPOCH};

/// Millisecond time source
///
/// Readings are expected to be non-decreasing, but callers must tolerate a
/// clock that moves backward (wall-clock adjustments).
pub trait Clock: Send + Sync + 'static {
    /// Current time in milliseconds
    fn now_ms(&self) -> i64;
}

/// Wall clock: milliseconds since the UNIX epoch
///
/// Can jump backward when the system time is adjusted.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(elapsed) => elapsed.as_millis() as i64,
            // System time before the epoch
            Err(err) => -(err.duration().as_millis() as i64),
        }
    }
}

/// Monotonic clock on `tokio::time`
///
/// Reports milliseconds elapsed since the clock was created. Follows paused
/// and advanced time in tokio tests.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin: tokio::time::Instant,
}

impl TokioClock {
    /// Create a clock starting at zero now
    pub fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now_ms(&self) -> i64 {
        self.origin.elapsed().as_millis() as i64
    }
}
