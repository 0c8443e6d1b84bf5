//! Debounce scheduler
//!
//! A `Debounced` proxy delays invoking the wrapped function until `wait` has
//! elapsed since the last call. Per window it can invoke on the leading edge,
//! the trailing edge (with the latest arguments), or both, and `max_wait`
//! forces an invocation under continuous calls.
//!
//! State machine: idle (no timer) -> scheduled (timer pending) -> idle after
//! a trailing edge, `flush` or `cancel`. When the timer fires early relative
//! to the latest call it reschedules itself for the remaining wait.

use crate::config::DebounceConfig;
use crate::error::DebounceError;
use crate::options::DebounceOptions;
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;
use std::time::Duration;
use timing::{Host, TimerHandle};
use tracing::{debug, trace};

type Func<A, R> = dyn Fn(A) -> R + Send + Sync + 'static;

/// Debounced proxy around a function `Fn(A) -> R`
///
/// Multi-argument functions take a tuple. Clones share one scheduler, so a
/// clone can be captured by the wrapped function for re-entrant calls.
pub struct Debounced<A, R> {
    shared: Arc<Shared<A, R>>,
}

struct Shared<A, R> {
    func: Box<Func<A, R>>,
    wait: Duration,
    options: DebounceOptions,
    wait_ms: i64,
    max_wait_ms: Option<i64>,
    host: Host,
    state: Mutex<State<A, R>>,
}

struct State<A, R> {
    /// Pending timer (at most one)
    timer: Option<PendingTimer>,

    /// Bumped per scheduled timer so superseded firings can be ignored
    generation: u64,

    /// Time of the latest call; `None` starts a fresh cycle
    last_call_time: Option<i64>,

    /// Time of the latest invocation or leading-edge window start (0 = never)
    last_invoke_time: i64,

    /// Arguments awaiting a trailing invocation
    last_args: Option<A>,

    /// Result of the latest invocation
    last_result: Option<R>,
}

#[derive(Debug, Clone, Copy)]
struct PendingTimer {
    handle: TimerHandle,
    generation: u64,
}

/// Debounce `func` on the tokio runtime of the calling thread
pub fn debounce<A, R, F>(
    func: F,
    wait: Duration,
    options: DebounceOptions,
) -> Result<Debounced<A, R>, DebounceError>
where
    A: Send + 'static,
    R: Clone + Send + 'static,
    F: Fn(A) -> R + Send + Sync + 'static,
{
    Debounced::new(func, wait, options)
}

impl<A, R> Debounced<A, R>
where
    A: Send + 'static,
    R: Clone + Send + 'static,
{
    /// Create a debouncer on the tokio runtime of the calling thread
    ///
    /// Fails with `NoRuntime` outside a runtime.
    pub fn new<F>(func: F, wait: Duration, options: DebounceOptions) -> Result<Self, DebounceError>
    where
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        let host = Host::tokio()?;
        Ok(Self::with_host(func, wait, options, host))
    }

    /// Create a debouncer on an explicit clock and timer service
    pub fn with_host<F>(func: F, wait: Duration, options: DebounceOptions, host: Host) -> Self
    where
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        let shared = Shared {
            func: Box::new(func),
            wait,
            options,
            wait_ms: duration_ms(wait),
            max_wait_ms: options.max_wait.map(duration_ms),
            host,
            state: Mutex::new(State {
                timer: None,
                generation: 0,
                last_call_time: None,
                last_invoke_time: 0,
                last_args: None,
                last_result: None,
            }),
        };

        Self {
            shared: Arc::new(shared),
        }
    }

    /// Create a debouncer from raw configuration values
    ///
    /// Fails with `InvalidArgument` for negative or non-finite values.
    pub fn from_config<F>(func: F, config: &DebounceConfig, host: Host) -> Result<Self, DebounceError>
    where
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        let (wait, options) = config.validate()?;
        Ok(Self::with_host(func, wait, options, host))
    }

    /// Call the proxy
    ///
    /// Returns the result of an invocation performed by this call, or else
    /// the result of the latest invocation (`None` if there was none).
    pub fn call(&self, args: A) -> Option<R> {
        let shared = &self.shared;
        let now = shared.host.now_ms();
        let mut state = shared.state.lock();

        let is_invoking = shared.should_invoke(&state, now);
        state.last_args = Some(args);
        state.last_call_time = Some(now);

        if is_invoking {
            if state.timer.is_none() {
                return shared.leading_edge(state, now);
            }
            if shared.max_wait_ms.is_some() {
                debug!(at_ms = now, "max wait reached, invoking mid-window");
                shared.start_timer(&mut state, shared.wait_ms);
                return match state.last_args.take() {
                    Some(args) => Some(shared.invoke(state, args, now)),
                    None => state.last_result.clone(),
                };
            }
        }

        if state.timer.is_none() {
            shared.start_timer(&mut state, shared.wait_ms);
        }
        state.last_result.clone()
    }

    /// Drop any pending invocation and reset call tracking
    ///
    /// The latest result is kept. Calling it with nothing pending is a no-op.
    pub fn cancel(&self) {
        let mut state = self.shared.state.lock();
        if let Some(timer) = state.timer.take() {
            self.shared.host.timers.cancel(timer.handle);
            debug!("debounce cancelled");
        }
        state.last_invoke_time = 0;
        state.last_args = None;
        state.last_call_time = None;
    }

    /// Run the trailing edge now if a timer is pending
    ///
    /// Returns the invocation result, or the latest result if nothing ran.
    pub fn flush(&self) -> Option<R> {
        let state = self.shared.state.lock();
        if state.timer.is_none() {
            return state.last_result.clone();
        }
        let now = self.shared.host.now_ms();
        debug!(at_ms = now, "debounce flushed");
        self.shared.trailing_edge(state, now)
    }

    /// Whether a timer is currently scheduled
    pub fn pending(&self) -> bool {
        self.shared.state.lock().timer.is_some()
    }

    /// Debounce window
    pub fn wait(&self) -> Duration {
        self.shared.wait
    }

    /// Edge options
    pub fn options(&self) -> DebounceOptions {
        self.shared.options
    }
}

impl<A, R> Shared<A, R>
where
    A: Send + 'static,
    R: Clone + Send + 'static,
{
    fn should_invoke(&self, state: &State<A, R>, now: i64) -> bool {
        let Some(last_call_time) = state.last_call_time else {
            return true;
        };
        let since_last_call = now.saturating_sub(last_call_time);
        let since_last_invoke = now.saturating_sub(state.last_invoke_time);

        since_last_call >= self.wait_ms
            // Clock moved backward
            || since_last_call < 0
            || self
                .max_wait_ms
                .is_some_and(|max_wait| since_last_invoke >= max_wait)
    }

    fn remaining_wait(&self, state: &State<A, R>, now: i64) -> i64 {
        let since_last_call = now.saturating_sub(state.last_call_time.unwrap_or(0));
        let since_last_invoke = now.saturating_sub(state.last_invoke_time);
        let waiting = self.wait_ms.saturating_sub(since_last_call);

        match self.max_wait_ms {
            Some(max_wait) => waiting.min(max_wait.saturating_sub(since_last_invoke)),
            None => waiting,
        }
    }

    fn leading_edge(self: &Arc<Self>, mut state: MutexGuard<'_, State<A, R>>, now: i64) -> Option<R> {
        state.last_invoke_time = now;
        self.start_timer(&mut state, self.wait_ms);

        if self.options.leading {
            if let Some(args) = state.last_args.take() {
                debug!(at_ms = now, "debounce leading edge");
                return Some(self.invoke(state, args, now));
            }
        }
        state.last_result.clone()
    }

    fn trailing_edge(&self, mut state: MutexGuard<'_, State<A, R>>, now: i64) -> Option<R> {
        if let Some(timer) = state.timer.take() {
            self.host.timers.cancel(timer.handle);
        }

        if self.options.trailing {
            if let Some(args) = state.last_args.take() {
                debug!(at_ms = now, "debounce trailing edge");
                return Some(self.invoke(state, args, now));
            }
        }
        state.last_args = None;
        state.last_result.clone()
    }

    /// Invoke the wrapped function with the state lock released
    fn invoke(&self, mut state: MutexGuard<'_, State<A, R>>, args: A, now: i64) -> R {
        state.last_invoke_time = now;
        drop(state);

        let result = (self.func)(args);
        self.state.lock().last_result = Some(result.clone());
        result
    }

    /// Schedule the timer, replacing any pending one
    fn start_timer(self: &Arc<Self>, state: &mut State<A, R>, delay_ms: i64) {
        if let Some(previous) = state.timer.take() {
            self.host.timers.cancel(previous.handle);
        }

        state.generation = state.generation.wrapping_add(1);
        let generation = state.generation;
        let weak = Arc::downgrade(self);
        let delay = Duration::from_millis(delay_ms.max(0) as u64);

        let handle = self.host.timers.schedule_after(
            delay,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.timer_expired(generation);
                }
            }),
        );
        trace!(generation, delay_ms = delay_ms.max(0), "debounce timer scheduled");

        state.timer = Some(PendingTimer { handle, generation });
    }

    fn timer_expired(self: &Arc<Self>, generation: u64) {
        let now = self.host.now_ms();
        let mut state = self.state.lock();

        if state.timer.map(|timer| timer.generation) != Some(generation) {
            trace!(generation, "ignoring superseded debounce timer");
            return;
        }
        state.timer = None;

        if self.should_invoke(&state, now) {
            self.trailing_edge(state, now);
        } else {
            let remaining = self.remaining_wait(&state, now);
            self.start_timer(&mut state, remaining);
        }
    }
}

impl<A, R> Drop for Shared<A, R> {
    fn drop(&mut self) {
        if let Some(timer) = self.state.get_mut().timer.take() {
            self.host.timers.cancel(timer.handle);
        }
    }
}

impl<A, R> Clone for Debounced<A, R> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<A, R> std::fmt::Debug for Debounced<A, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debounced")
            .field("wait", &self.shared.wait)
            .field("options", &self.shared.options)
            .field("pending", &self.shared.state.lock().timer.is_some())
            .finish()
    }
}

fn duration_ms(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

#[cfg(test)]
#[path = "debounced_tests.rs"]
mod debounced_tests;
