//! Virtual time for deterministic scheduling
//!
//! `ManualTime` is both a `Clock` and a `TimerService`. Time only moves when
//! the owner calls `advance`, `advance_to` or `set_now`; due timers run on the
//! calling thread in deadline order (ties in scheduling order).

use crate::{Clock, TimerHandle, TimerService, TimerTask};
use ahash::AHashMap;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::trace;

/// Virtual clock with a timer queue
pub struct ManualTime {
    inner: Mutex<Inner>,
}

struct Inner {
    /// Current virtual time (ms)
    now: i64,

    /// Monotonic id counter (also breaks deadline ties)
    next_id: u64,

    /// Scheduled tasks keyed by (deadline, id)
    queue: BTreeMap<(i64, u64), TimerTask>,

    /// id -> deadline, for cancellation
    deadlines: AHashMap<u64, i64>,
}

impl ManualTime {
    /// Create a virtual clock reading `start_ms`
    pub fn new(start_ms: i64) -> Self {
        Self {
            inner: Mutex::new(Inner {
                now: start_ms,
                next_id: 1,
                queue: BTreeMap::new(),
                deadlines: AHashMap::new(),
            }),
        }
    }

    /// Move time forward by `by`, running every timer that falls due
    pub fn advance(&self, by: Duration) {
        let target = self.inner.lock().now.saturating_add(millis(by));
        self.advance_to(target);
    }

    /// Move time forward to `target_ms`, running every timer that falls due
    ///
    /// Timers scheduled by running tasks are honoured if they fall due before
    /// `target_ms`. A target in the past leaves the clock unchanged.
    pub fn advance_to(&self, target_ms: i64) {
        loop {
            // Never hold the lock while a task runs: tasks schedule timers
            let task = {
                let mut inner = self.inner.lock();
                let due = match inner.queue.keys().next() {
                    Some(&(deadline, id)) if deadline <= target_ms => (deadline, id),
                    _ => break,
                };
                inner.deadlines.remove(&due.1);
                if due.0 > inner.now {
                    inner.now = due.0;
                }
                trace!(timer = due.1, at_ms = due.0, "virtual timer fired");
                inner.queue.remove(&due)
            };

            if let Some(task) = task {
                task();
            }
        }

        let mut inner = self.inner.lock();
        if target_ms > inner.now {
            inner.now = target_ms;
        }
    }

    /// Run timers until none remain, advancing time as needed
    ///
    /// Returns the virtual time afterwards.
    pub fn run_until_idle(&self) -> i64 {
        while let Some(deadline) = self.next_deadline() {
            self.advance_to(deadline);
        }
        self.now_ms()
    }

    /// Set the clock to an arbitrary reading without running timers
    ///
    /// Allows simulating a clock that jumps backward.
    pub fn set_now(&self, now_ms: i64) {
        self.inner.lock().now = now_ms;
    }

    /// Deadline of the earliest scheduled timer
    pub fn next_deadline(&self) -> Option<i64> {
        self.inner.lock().queue.keys().next().map(|&(deadline, _)| deadline)
    }

    /// Number of scheduled timers
    pub fn pending_timers(&self) -> usize {
        self.inner.lock().queue.len()
    }
}

impl Default for ManualTime {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Clock for ManualTime {
    fn now_ms(&self) -> i64 {
        self.inner.lock().now
    }
}

impl TimerService for ManualTime {
    fn schedule_after(&self, delay: Duration, task: TimerTask) -> TimerHandle {
        let mut inner = self.inner.lock();
        let id = inner.next_id;
        inner.next_id += 1;

        // Deadlines past the end of time saturate and never fall due
        let deadline = inner.now.saturating_add(millis(delay));
        inner.queue.insert((deadline, id), task);
        inner.deadlines.insert(id, deadline);

        TimerHandle::from_raw(id)
    }

    fn cancel(&self, handle: TimerHandle) {
        let mut inner = self.inner.lock();
        if let Some(deadline) = inner.deadlines.remove(&handle.id()) {
            inner.queue.remove(&(deadline, handle.id()));
        }
    }
}

fn millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

impl std::fmt::Debug for ManualTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("ManualTime")
            .field("now", &inner.now)
            .field("pending_timers", &inner.queue.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn log_task(time: &Arc<ManualTime>, log: &Arc<Mutex<Vec<(i64, &'static str)>>>, label: &'static str) -> TimerTask {
        let time = time.clone();
        let log = log.clone();
        Box::new(move || log.lock().push((time.now_ms(), label)))
    }

    #[test]
    fn test_timers_run_at_their_deadline() {
        let time = Arc::new(ManualTime::new(0));
        let log = Arc::new(Mutex::new(Vec::new()));

        time.schedule_after(Duration::from_millis(30), log_task(&time, &log, "b"));
        time.schedule_after(Duration::from_millis(10), log_task(&time, &log, "a"));

        time.advance(Duration::from_millis(5));
        assert!(log.lock().is_empty());
        assert_eq!(time.now_ms(), 5);

        time.advance(Duration::from_millis(100));
        assert_eq!(*log.lock(), vec![(10, "a"), (30, "b")]);
        assert_eq!(time.now_ms(), 105);
        assert_eq!(time.pending_timers(), 0);
    }

    #[test]
    fn test_equal_deadlines_fire_in_schedule_order() {
        let time = Arc::new(ManualTime::new(0));
        let log = Arc::new(Mutex::new(Vec::new()));

        time.schedule_after(Duration::from_millis(10), log_task(&time, &log, "first"));
        time.schedule_after(Duration::from_millis(10), log_task(&time, &log, "second"));

        time.advance_to(10);
        assert_eq!(*log.lock(), vec![(10, "first"), (10, "second")]);
    }

    #[test]
    fn test_cancel_removes_timer() {
        let time = Arc::new(ManualTime::new(0));
        let log = Arc::new(Mutex::new(Vec::new()));

        let handle = time.schedule_after(Duration::from_millis(10), log_task(&time, &log, "a"));
        assert_eq!(time.pending_timers(), 1);

        time.cancel(handle);
        time.cancel(handle);
        assert_eq!(time.pending_timers(), 0);

        time.advance(Duration::from_millis(50));
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_tasks_can_schedule_follow_up_timers() {
        let time = Arc::new(ManualTime::new(0));
        let log = Arc::new(Mutex::new(Vec::new()));

        let inner_time = time.clone();
        let inner_log = log.clone();
        time.schedule_after(
            Duration::from_millis(10),
            Box::new(move || {
                let follow_up = log_task(&inner_time, &inner_log, "follow-up");
                inner_time.schedule_after(Duration::from_millis(5), follow_up);
            }),
        );

        time.advance_to(20);
        assert_eq!(*log.lock(), vec![(15, "follow-up")]);
    }

    #[test]
    fn test_run_until_idle_drains_queue() {
        let time = Arc::new(ManualTime::new(100));
        let log = Arc::new(Mutex::new(Vec::new()));

        time.schedule_after(Duration::from_millis(40), log_task(&time, &log, "a"));
        time.schedule_after(Duration::from_millis(90), log_task(&time, &log, "b"));

        assert_eq!(time.next_deadline(), Some(140));
        assert_eq!(time.run_until_idle(), 190);
        assert_eq!(log.lock().len(), 2);
        assert_eq!(time.next_deadline(), None);
    }

    #[test]
    fn test_near_max_delay_saturates() {
        let time = Arc::new(ManualTime::new(10));
        let log = Arc::new(Mutex::new(Vec::new()));

        time.schedule_after(Duration::from_secs(u64::MAX / 1000), log_task(&time, &log, "never"));
        assert_eq!(time.next_deadline(), Some(i64::MAX));

        time.advance_to(20);
        time.advance(Duration::from_secs(86_400 * 365));
        assert!(log.lock().is_empty());
        assert_eq!(time.pending_timers(), 1);
    }

    #[test]
    fn test_set_now_can_move_backward() {
        let time = ManualTime::new(500);
        time.set_now(200);
        assert_eq!(time.now_ms(), 200);

        // Advancing to a past target leaves the clock alone
        time.advance_to(100);
        assert_eq!(time.now_ms(), 200);
    }
}
