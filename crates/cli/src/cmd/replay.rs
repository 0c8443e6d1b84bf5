//! Replay command
//!
//! Feeds a timed call schedule through a debouncer and reports each
//! invocation with the edge that produced it. The default replay runs on a
//! virtual clock, so output is exact and instant; `--realtime` uses the
//! tokio timer host and real sleeps instead.

use super::schedule::{self, Action, Event};
use anyhow::{bail, Context, Result};
use clap::Args;
use debounce::{DebounceConfig, Debounced, Host, ManualTime};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use serde::Serialize;
use std::cell::Cell;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const POLL_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Debounce window in milliseconds
    #[arg(long, allow_negative_numbers = true)]
    pub wait_ms: Option<f64>,

    /// Max-wait ceiling in milliseconds
    #[arg(long, allow_negative_numbers = true)]
    pub max_wait_ms: Option<f64>,

    /// Invoke on the leading edge
    #[arg(long)]
    pub leading: bool,

    /// Skip the trailing-edge invocation
    #[arg(long)]
    pub no_trailing: bool,

    /// Load settings from a TOML file (flags override it)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Flush the debouncer at this time (ms)
    #[arg(long)]
    pub flush_at: Option<u64>,

    /// Cancel the debouncer at this time (ms)
    #[arg(long)]
    pub cancel_at: Option<u64>,

    /// Replay against the wall clock instead of a virtual one
    #[arg(long)]
    pub realtime: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Calls to replay, e.g. 0:a 50:b 90:c
    #[arg(required = true, value_name = "TIME:ARG")]
    pub calls: Vec<String>,
}

/// How an invocation came about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Edge {
    Leading,
    MaxWait,
    Trailing,
    Flush,
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Edge::Leading => "leading",
            Edge::MaxWait => "max-wait",
            Edge::Trailing => "trailing",
            Edge::Flush => "flush",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    pub at_ms: i64,
    pub arg: String,
    pub edge: Edge,
}

#[derive(Debug, Serialize)]
struct Report {
    wait_ms: f64,
    max_wait_ms: Option<f64>,
    leading: bool,
    trailing: bool,
    calls: usize,
    invocations: Vec<Invocation>,
}

/// What the replay driver is doing on the current thread
#[derive(Debug, Clone, Copy)]
enum Phase {
    Call { timer_pending: bool },
    Flush,
    Timer,
}

impl Phase {
    fn edge(self) -> Edge {
        match self {
            Phase::Call { timer_pending: false } => Edge::Leading,
            Phase::Call { timer_pending: true } => Edge::MaxWait,
            Phase::Flush => Edge::Flush,
            Phase::Timer => Edge::Trailing,
        }
    }
}

thread_local! {
    // Timer callbacks on tokio workers always observe `Timer`
    static PHASE: Cell<Phase> = const { Cell::new(Phase::Timer) };
}

struct Replay {
    debounced: Debounced<String, usize>,
    invocations: Arc<Mutex<Vec<Invocation>>>,
}

impl Replay {
    fn new(config: &DebounceConfig, host: Host) -> Result<Self> {
        let invocations = Arc::new(Mutex::new(Vec::new()));
        let sink = invocations.clone();
        let clock = host.clone();

        let func = move |arg: String| {
            let edge = PHASE.with(|phase| phase.get()).edge();
            let at_ms = clock.now_ms();
            debug!(at_ms, %arg, %edge, "invoked");

            let mut sink = sink.lock();
            sink.push(Invocation { at_ms, arg, edge });
            sink.len()
        };

        let debounced = Debounced::from_config(func, config, host)?;
        Ok(Self {
            debounced,
            invocations,
        })
    }

    fn apply(&self, action: &Action) {
        match action {
            Action::Call(arg) => {
                let timer_pending = self.debounced.pending();
                PHASE.with(|phase| phase.set(Phase::Call { timer_pending }));
                self.debounced.call(arg.clone());
            }
            Action::Flush => {
                PHASE.with(|phase| phase.set(Phase::Flush));
                self.debounced.flush();
            }
            Action::Cancel => self.debounced.cancel(),
        }
        PHASE.with(|phase| phase.set(Phase::Timer));
    }

    fn finish(self) -> Vec<Invocation> {
        self.debounced.cancel();
        std::mem::take(&mut *self.invocations.lock())
    }
}

pub async fn run(args: ReplayArgs) -> Result<()> {
    let config = resolve_config(&args)?;
    let events = schedule::build(&args.calls, args.flush_at, args.cancel_at)?;
    info!(events = events.len(), realtime = args.realtime, "replaying schedule");

    let invocations = if args.realtime {
        replay_realtime(&config, &events).await?
    } else {
        replay_virtual(&config, &events)?
    };

    let report = Report {
        wait_ms: config.wait_ms,
        max_wait_ms: config.max_wait_ms,
        leading: config.leading,
        trailing: config.trailing,
        calls: args.calls.len(),
        invocations,
    };

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to encode report")?;
        println!("{}", json);
    } else {
        for invocation in &report.invocations {
            println!("{}", format_invocation(invocation));
        }
        eprintln!(
            "{}",
            format!(
                "{} invocation(s) from {} call(s)",
                report.invocations.len(),
                report.calls
            )
            .dimmed()
        );
    }
    Ok(())
}

fn format_invocation(invocation: &Invocation) -> String {
    format!(
        "t={} arg={} ({})",
        invocation.at_ms, invocation.arg, invocation.edge
    )
}

/// Merge the config file (if any) with command-line overrides
fn resolve_config(args: &ReplayArgs) -> Result<DebounceConfig> {
    let mut config = match (&args.config, args.wait_ms) {
        (Some(path), _) => DebounceConfig::load(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        (None, Some(wait_ms)) => DebounceConfig::new(wait_ms),
        (None, None) => bail!("either --wait-ms or --config is required"),
    };

    if let Some(wait_ms) = args.wait_ms {
        config.wait_ms = wait_ms;
    }
    if args.max_wait_ms.is_some() {
        config.max_wait_ms = args.max_wait_ms;
    }
    if args.leading {
        config.leading = true;
    }
    if args.no_trailing {
        config.trailing = false;
    }

    config.validate().context("Invalid debounce settings")?;
    Ok(config)
}

/// Replay on a virtual clock starting at 0
///
/// Timers due at an event's instant fire before the event is applied.
fn replay_virtual(config: &DebounceConfig, events: &[Event]) -> Result<Vec<Invocation>> {
    let time = Arc::new(ManualTime::new(0));
    let replay = Replay::new(config, Host::manual(&time))?;

    for event in events {
        time.advance_to(event.at_ms as i64);
        replay.apply(&event.action);
    }
    let end_ms = time.run_until_idle();
    debug!(end_ms, "virtual replay finished");

    Ok(replay.finish())
}

/// Replay against tokio time, waiting for the last timer to settle
async fn replay_realtime(config: &DebounceConfig, events: &[Event]) -> Result<Vec<Invocation>> {
    let start = tokio::time::Instant::now();
    let host = Host::tokio().context("Realtime replay needs a tokio runtime")?;
    let replay = Replay::new(config, host)?;

    for event in events {
        tokio::time::sleep_until(start + Duration::from_millis(event.at_ms)).await;
        replay.apply(&event.action);
    }
    while replay.debounced.pending() {
        tokio::time::sleep(POLL_INTERVAL).await;
    }
    debug!(elapsed_ms = start.elapsed().as_millis() as u64, "realtime replay finished");

    Ok(replay.finish())
}
