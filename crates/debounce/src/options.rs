//! Edge and ceiling options

use std::time::Duration;

/// Debounce edge options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceOptions {
    /// Invoke on the leading edge of a window (default: false)
    pub leading: bool,

    /// Invoke on the trailing edge of a window (default: true)
    pub trailing: bool,

    /// Longest time between invocations under continuous calls
    ///
    /// Expected to be at least the wait; not enforced.
    pub max_wait: Option<Duration>,
}

impl DebounceOptions {
    /// Set the leading-edge flag
    pub fn leading(mut self, leading: bool) -> Self {
        self.leading = leading;
        self
    }

    /// Set the trailing-edge flag
    pub fn trailing(mut self, trailing: bool) -> Self {
        self.trailing = trailing;
        self
    }

    /// Set the max-wait ceiling
    pub fn max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }
}

impl Default for DebounceOptions {
    fn default() -> Self {
        Self {
            leading: false,
            trailing: true,
            max_wait: None,
        }
    }
}

/// Throttle edge options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleOptions {
    /// Invoke on the leading edge (default: true)
    pub leading: bool,

    /// Invoke on the trailing edge (default: true)
    pub trailing: bool,
}

impl ThrottleOptions {
    /// Equivalent debounce options: the ceiling equals the wait
    pub fn to_debounce(self, wait: Duration) -> DebounceOptions {
        DebounceOptions {
            leading: self.leading,
            trailing: self.trailing,
            max_wait: Some(wait),
        }
    }
}

impl Default for ThrottleOptions {
    fn default() -> Self {
        Self {
            leading: true,
            trailing: true,
        }
    }
}
