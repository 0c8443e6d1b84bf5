//! Serializable debounce settings
//!
//! Millisecond values arrive as raw numbers (TOML floats or integers), so
//! they are validated before a scheduler is built:
//!
//! ```toml
//! wait_ms = 100
//! leading = false
//! trailing = true
//! max_wait_ms = 150
//! ```

use crate::error::DebounceError;
use crate::options::DebounceOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const EXAMPLE_CONFIG: &str = r#"# Delay after the last call before the trailing invocation (ms)
wait_ms = 100

# Invoke on the first call of a burst
leading = false

# Invoke once the burst has been quiet for wait_ms
trailing = true

# Force an invocation at least this often under continuous calls (ms)
# max_wait_ms = 500
"#;

/// Debounce settings as written in configuration files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebounceConfig {
    /// Debounce window in milliseconds
    pub wait_ms: f64,

    /// Leading-edge invocation (default: false)
    #[serde(default)]
    pub leading: bool,

    /// Trailing-edge invocation (default: true)
    #[serde(default = "default_true")]
    pub trailing: bool,

    /// Max-wait ceiling in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_wait_ms: Option<f64>,
}

impl DebounceConfig {
    /// Settings with the given window and default edges
    pub fn new(wait_ms: f64) -> Self {
        Self {
            wait_ms,
            leading: false,
            trailing: true,
            max_wait_ms: None,
        }
    }

    /// Check the millisecond values and convert to typed options
    pub fn validate(&self) -> Result<(Duration, DebounceOptions), DebounceError> {
        let wait = millis_to_duration("wait_ms", self.wait_ms)?;
        let max_wait = self
            .max_wait_ms
            .map(|ms| millis_to_duration("max_wait_ms", ms))
            .transpose()?;

        let options = DebounceOptions {
            leading: self.leading,
            trailing: self.trailing,
            max_wait,
        };
        Ok((wait, options))
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, DebounceError> {
        let config: Self =
            toml::from_str(text).map_err(|e| DebounceError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: &Path) -> Result<Self, DebounceError> {
        let text = std::fs::read_to_string(path).map_err(|source| DebounceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String, DebounceError> {
        toml::to_string_pretty(self).map_err(|e| DebounceError::Config(e.to_string()))
    }

    /// Commented example configuration
    pub fn example() -> &'static str {
        EXAMPLE_CONFIG
    }
}

fn millis_to_duration(field: &str, ms: f64) -> Result<Duration, DebounceError> {
    if !ms.is_finite() || ms < 0.0 {
        return Err(DebounceError::InvalidArgument(format!(
            "{} must be a finite, non-negative number of milliseconds (got {})",
            field, ms
        )));
    }
    Duration::try_from_secs_f64(ms / 1000.0).map_err(|_| {
        DebounceError::InvalidArgument(format!(
            "{} is too large to represent as a duration (got {})",
            field, ms
        ))
    })
}

fn default_true() -> bool {
    true
}
