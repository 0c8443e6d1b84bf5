//! Configuration commands
//!
//! Print an example debounce configuration or validate one on disk.

use anyhow::{Context, Result};
use debounce::DebounceConfig;
use owo_colors::OwoColorize;
use std::path::Path;

/// Print the commented example configuration
pub fn run_example() -> Result<()> {
    print!("{}", DebounceConfig::example());
    Ok(())
}

/// Load and validate a configuration file, then print the resolved settings
pub fn run_check(path: &Path) -> Result<()> {
    let config = DebounceConfig::load(path)
        .with_context(|| format!("Invalid configuration: {}", path.display()))?;

    println!("{} {}", "✓".green(), path.display());
    for line in describe(&config) {
        println!("  {}", line);
    }
    Ok(())
}

fn describe(config: &DebounceConfig) -> Vec<String> {
    let max_wait = match config.max_wait_ms {
        Some(ms) => format!("{}", ms),
        None => "none".to_string(),
    };
    vec![
        format!("wait_ms = {}", config.wait_ms),
        format!("leading = {}", config.leading),
        format!("trailing = {}", config.trailing),
        format!("max_wait_ms = {}", max_wait),
    ]
}
