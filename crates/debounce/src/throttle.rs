//! Throttling on top of the debounce scheduler
//!
//! A throttled function is a debounced one whose max-wait equals its wait, so
//! it runs at most once per window no matter how often it is called.

use crate::debounced::Debounced;
use crate::error::DebounceError;
use crate::options::ThrottleOptions;
use std::time::Duration;
use timing::Host;

/// Throttle `func` on the tokio runtime of the calling thread
pub fn throttle<A, R, F>(
    func: F,
    wait: Duration,
    options: ThrottleOptions,
) -> Result<Debounced<A, R>, DebounceError>
where
    A: Send + 'static,
    R: Clone + Send + 'static,
    F: Fn(A) -> R + Send + Sync + 'static,
{
    Debounced::new(func, wait, options.to_debounce(wait))
}

/// Throttle `func` on an explicit clock and timer service
pub fn throttle_with_host<A, R, F>(
    func: F,
    wait: Duration,
    options: ThrottleOptions,
    host: Host,
) -> Debounced<A, R>
where
    A: Send + 'static,
    R: Clone + Send + 'static,
    F: Fn(A) -> R + Send + Sync + 'static,
{
    Debounced::with_host(func, wait, options.to_debounce(wait), host)
}
