//! Timer service on the tokio runtime
//!
//! Each scheduled timer is a spawned task that sleeps until its deadline and
//! then runs the callback. Cancellation aborts the task.

use crate::{TimerHandle, TimerService, TimerTask, TimingError};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tracing::trace;

/// Timer service that spawns one tokio task per timer
pub struct TokioTimer {
    /// Runtime the timer tasks are spawned on
    runtime: Handle,

    /// Outstanding timers (id -> task abort handle)
    tasks: Arc<DashMap<u64, AbortHandle>>,

    /// Monotonic id counter
    next_id: AtomicU64,
}

impl TokioTimer {
    /// Create a timer service on an explicit runtime
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            tasks: Arc::new(DashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Create a timer service on the runtime of the calling thread
    pub fn current() -> Result<Self, TimingError> {
        let runtime = Handle::try_current().map_err(|_| TimingError::NoRuntime)?;
        Ok(Self::new(runtime))
    }

    /// Number of timers that have neither fired nor been cancelled
    pub fn outstanding(&self) -> usize {
        self.tasks.len()
    }
}

impl TimerService for TokioTimer {
    fn schedule_after(&self, delay: Duration, task: TimerTask) -> TimerHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        // `None` when the deadline is beyond what an `Instant` can hold
        let deadline = tokio::time::Instant::now().checked_add(delay);
        let tasks = Arc::clone(&self.tasks);

        // The task must not deregister itself before it has been registered
        let (registered_tx, registered_rx) = oneshot::channel::<()>();

        let join = self.runtime.spawn(async move {
            let _ = registered_rx.await;
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
            if tasks.remove(&id).is_some() {
                trace!(timer = id, "timer fired");
                task();
            }
        });

        self.tasks.insert(id, join.abort_handle());
        let _ = registered_tx.send(());

        TimerHandle::from_raw(id)
    }

    fn cancel(&self, handle: TimerHandle) {
        if let Some((id, abort)) = self.tasks.remove(&handle.id()) {
            trace!(timer = id, "timer cancelled");
            abort.abort();
        }
    }
}

impl Drop for TokioTimer {
    fn drop(&mut self) {
        for entry in self.tasks.iter() {
            entry.value().abort();
        }
        self.tasks.clear();
    }
}

impl std::fmt::Debug for TokioTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokioTimer")
            .field("outstanding", &self.tasks.len())
            .finish()
    }
}
