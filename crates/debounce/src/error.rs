//! Construction and configuration errors

use std::path::PathBuf;
use thiserror::Error;
use timing::TimingError;

/// Errors raised while building a scheduler
///
/// Nothing is raised once a scheduler exists; calls, timer firings, `cancel`
/// and `flush` are infallible.
#[derive(Debug, Error)]
pub enum DebounceError {
    /// A wait or max-wait value is negative, infinite or NaN
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The default host needs a running tokio runtime
    #[error(transparent)]
    NoRuntime(#[from] TimingError),

    /// Configuration text could not be parsed or serialized
    #[error("invalid debounce configuration: {0}")]
    Config(String),

    /// Configuration file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
