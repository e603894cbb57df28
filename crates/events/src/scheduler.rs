//! Delayed-task scheduling for simulated backend latency.
//!
//! Stores never sleep themselves. Each asynchronous operation hands its
//! completion to a [`Scheduler`] with the latency it should simulate, and the
//! scheduler decides what "later" means:
//!
//! - [`TokioScheduler`]: real wall-clock delay on a tokio runtime.
//! - [`ImmediateScheduler`]: runs the task inline (zero-delay test mode).
//! - [`ManualScheduler`]: virtual time, advanced explicitly by tests.
//!
//! Every scheduled task is independent: a task scheduled later with a shorter
//! delay completes before an earlier one with a longer delay. Schedulers do
//! not serialize tasks.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use bistro_core::DomainResult;

use crate::pending::{Pending, pending};

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs tasks after a delay.
pub trait Scheduler: Send + Sync {
    fn after(&self, delay: Duration, task: Task);
}

impl<S> Scheduler for Arc<S>
where
    S: Scheduler + ?Sized,
{
    fn after(&self, delay: Duration, task: Task) {
        (**self).after(delay, task)
    }
}

/// Schedule `op` to run after `delay` and hand back a [`Pending`] for its result.
///
/// The operation runs even if the returned handle is dropped first.
pub fn schedule<S, T, F>(scheduler: &S, delay: Duration, op: F) -> Pending<T>
where
    S: Scheduler + ?Sized,
    T: Send + 'static,
    F: FnOnce() -> DomainResult<T> + Send + 'static,
{
    let (completer, handle) = pending();
    scheduler.after(delay, Box::new(move || completer.complete(op())));
    handle
}

/// Executes every task synchronously inside `after`, ignoring the delay.
#[derive(Debug, Default, Copy, Clone)]
pub struct ImmediateScheduler;

impl Scheduler for ImmediateScheduler {
    fn after(&self, _delay: Duration, task: Task) {
        task();
    }
}

/// Spawns each task on a tokio runtime behind a `tokio::time::sleep`.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: tokio::runtime::Handle,
}

impl TokioScheduler {
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Bind to the runtime of the calling context.
    pub fn current() -> Result<Self, tokio::runtime::TryCurrentError> {
        tokio::runtime::Handle::try_current().map(Self::new)
    }
}

impl Scheduler for TokioScheduler {
    fn after(&self, delay: Duration, task: Task) {
        self.handle.spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            task();
        });
    }
}

struct Queued {
    due: Duration,
    seq: u64,
    task: Task,
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    seq: u64,
    queue: Vec<Queued>,
}

/// Virtual-time scheduler.
///
/// Tasks run only when [`ManualScheduler::advance`] moves the virtual clock
/// past their due time, in due-time order (ties in scheduling order). Tasks
/// scheduled by a running task are picked up in the same `advance` call if
/// they fall due within it.
#[derive(Default)]
pub struct ManualScheduler {
    state: Mutex<ManualState>,
}

impl core::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("ManualScheduler")
            .field("now", &state.now)
            .field("queued", &state.queue.len())
            .finish()
    }
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time since construction.
    pub fn now(&self) -> Duration {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .now
    }

    /// Number of tasks still waiting.
    pub fn queued(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .queue
            .len()
    }

    /// Advance virtual time by `by`, running every task that falls due.
    /// Returns how many tasks ran.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now() + by;
        let mut ran = 0;

        while let Some(task) = self.pop_due(target) {
            task();
            ran += 1;
        }

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.now < target {
            state.now = target;
        }
        tracing::trace!(ran, now_ms = state.now.as_millis() as u64, "manual scheduler advanced");
        ran
    }

    /// Run queued tasks until none remain, advancing time as needed.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        loop {
            let next_due = {
                let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
                state.queue.iter().map(|q| q.due).min()
            };
            match next_due {
                Some(due) => {
                    let by = due.saturating_sub(self.now());
                    ran += self.advance(by);
                }
                None => return ran,
            }
        }
    }

    fn pop_due(&self, target: Duration) -> Option<Task> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let idx = state
            .queue
            .iter()
            .enumerate()
            .filter(|(_, q)| q.due <= target)
            .min_by_key(|(_, q)| (q.due, q.seq))
            .map(|(i, _)| i)?;
        let queued = state.queue.swap_remove(idx);
        state.now = queued.due;
        Some(queued.task)
    }
}

impl Scheduler for ManualScheduler {
    fn after(&self, delay: Duration, task: Task) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let due = state.now + delay;
        let seq = state.seq;
        state.seq += 1;
        state.queue.push(Queued { due, seq, task });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log() -> Arc<Mutex<Vec<&'static str>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn push(log: &Arc<Mutex<Vec<&'static str>>>, tag: &'static str) -> Task {
        let log = Arc::clone(log);
        Box::new(move || log.lock().unwrap().push(tag))
    }

    #[test]
    fn immediate_runs_inline() {
        let events = log();
        ImmediateScheduler.after(Duration::from_secs(5), push(&events, "done"));
        assert_eq!(*events.lock().unwrap(), vec!["done"]);
    }

    #[test]
    fn manual_runs_nothing_until_advanced() {
        let sched = ManualScheduler::new();
        let events = log();
        sched.after(Duration::from_millis(100), push(&events, "a"));

        assert_eq!(sched.advance(Duration::from_millis(99)), 0);
        assert!(events.lock().unwrap().is_empty());

        assert_eq!(sched.advance(Duration::from_millis(1)), 1);
        assert_eq!(*events.lock().unwrap(), vec!["a"]);
        assert_eq!(sched.now(), Duration::from_millis(100));
    }

    #[test]
    fn shorter_delay_overtakes_earlier_task() {
        let sched = ManualScheduler::new();
        let events = log();
        sched.after(Duration::from_millis(1000), push(&events, "slow"));
        sched.after(Duration::from_millis(300), push(&events, "fast"));

        sched.run_until_idle();
        assert_eq!(*events.lock().unwrap(), vec!["fast", "slow"]);
    }

    #[test]
    fn equal_due_times_run_in_scheduling_order() {
        let sched = ManualScheduler::new();
        let events = log();
        sched.after(Duration::from_millis(10), push(&events, "first"));
        sched.after(Duration::from_millis(10), push(&events, "second"));

        sched.advance(Duration::from_millis(10));
        assert_eq!(*events.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn tasks_scheduled_while_running_are_relative_to_their_due_time() {
        let sched = Arc::new(ManualScheduler::new());
        let events = log();

        let inner_sched = Arc::clone(&sched);
        let inner_events = Arc::clone(&events);
        sched.after(
            Duration::from_millis(10),
            Box::new(move || {
                inner_events.lock().unwrap().push("outer");
                inner_sched.after(Duration::from_millis(5), push(&inner_events, "inner"));
            }),
        );

        sched.advance(Duration::from_millis(20));
        assert_eq!(*events.lock().unwrap(), vec!["outer", "inner"]);
        assert_eq!(sched.queued(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_scheduler_waits_for_delay() {
        let sched = TokioScheduler::current().unwrap();
        let result = schedule(&sched, Duration::from_millis(1500), || Ok(42));
        assert_eq!(result.await, Ok(42));
    }
}
