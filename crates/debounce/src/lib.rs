//! Debounce and throttle schedulers for Prodash
//!
//! This crate provides:
//! - `Debounced`: a callable proxy that coalesces bursts of calls
//!   (leading/trailing edges, `max_wait` ceiling, cancel/flush/pending)
//! - `throttle`: at most one invocation per window under continuous calls
//! - `DebounceConfig`: TOML-loadable settings with validation

pub mod config;
pub mod debounced;
pub mod error;
pub mod options;
pub mod throttle;

// Re-exports
pub use config::DebounceConfig;
pub use debounced::{debounce, Debounced};
pub use error::DebounceError;
pub use options::{DebounceOptions, ThrottleOptions};
pub use throttle::{throttle, throttle_with_host};
pub use timing::{Host, ManualTime};

/// Result type for debounce construction
pub type Result<T> = std::result::Result<T, DebounceError>;
