//! Replay schedules
//!
//! A schedule is a list of timed events: calls given as `TIME:ARG` plus the
//! optional flush and cancel instants. Times are milliseconds from the start
//! of the replay.

use anyhow::{bail, Context, Result};

/// What happens at a scheduled instant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Call(String),
    Flush,
    Cancel,
}

/// One event of a replay schedule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub at_ms: u64,
    pub action: Action,
}

/// Parse a `TIME:ARG` call; the argument may itself contain colons
pub fn parse_call(input: &str) -> Result<Event> {
    let (time, arg) = match input.split_once(':') {
        Some(parts) => parts,
        None => bail!("call '{}' must look like TIME:ARG", input),
    };

    let at_ms = time
        .trim()
        .parse::<u64>()
        .with_context(|| format!("call '{}' has an invalid time", input))?;

    Ok(Event {
        at_ms,
        action: Action::Call(arg.to_string()),
    })
}

/// Build the ordered event list
///
/// Events are ordered by time. At the same instant calls keep their command
/// line order and run before a flush, which runs before a cancel.
pub fn build(calls: &[String], flush_at: Option<u64>, cancel_at: Option<u64>) -> Result<Vec<Event>> {
    let mut events = calls
        .iter()
        .map(|call| parse_call(call))
        .collect::<Result<Vec<_>>>()?;

    if let Some(at_ms) = flush_at {
        events.push(Event {
            at_ms,
            action: Action::Flush,
        });
    }
    if let Some(at_ms) = cancel_at {
        events.push(Event {
            at_ms,
            action: Action::Cancel,
        });
    }

    // Stable: equal keys keep insertion order
    events.sort_by_key(|event| (event.at_ms, rank(&event.action)));
    Ok(events)
}

fn rank(action: &Action) -> u8 {
    match action {
        Action::Call(_) => 0,
        Action::Flush => 1,
        Action::Cancel => 2,
    }
}
