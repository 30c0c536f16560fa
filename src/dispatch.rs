//! # Dispatch Scheduler
//!
//! Owns the set of independently-timed periodic tasks (broker publish,
//! relay send, indicator refresh, fix-timeout check) and decides, on
//! every loop tick, which are due.
//!
//! Scheduling contract:
//!
//! - Tasks run strictly sequentially, in registration order, on the
//!   dispatch loop itself — actions must be quick and non-blocking.
//! - A task is due when `now - last_run >= interval`. `last_run` is
//!   initialized at registration, so a task first fires one full
//!   interval after startup, not immediately.
//! - `last_run` advances after every attempt, success or failure. A
//!   broken downstream channel therefore retries at most once per
//!   interval instead of busy-looping the tick.
//!
//! The scheduler is generic over a context type so tasks can read and
//! update engine state without the scheduler knowing its shape.

use std::time::{Duration, Instant};

use tracing::warn;

use crate::error::DispatchError;

/// What a task did when it ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The task performed its work
    Sent,
    /// Preconditions not met (no fix, no reference); nothing sent
    Skipped,
}

/// Boxed action signature shared by every task.
pub type TaskAction<C> =
    Box<dyn FnMut(Instant, &mut C) -> Result<TaskOutcome, DispatchError> + Send>;

/// A named periodic job. Created once at startup, never destroyed.
struct SchedulerTask<C> {
    name: &'static str,
    interval: Duration,
    last_run: Instant,
    action: TaskAction<C>,
}

/// Decides which periodic actions are due each tick and runs them.
pub struct DispatchScheduler<C> {
    tasks: Vec<SchedulerTask<C>>,
    started_at: Instant,
}

impl<C> DispatchScheduler<C> {
    /// Create an empty scheduler. `started_at` seeds `last_run` for all
    /// tasks registered before the first tick.
    pub fn new(started_at: Instant) -> Self {
        Self {
            tasks: Vec::new(),
            started_at,
        }
    }

    /// Register a task. Registration order is execution order.
    pub fn register(
        &mut self,
        name: &'static str,
        interval: Duration,
        action: TaskAction<C>,
    ) {
        self.tasks.push(SchedulerTask {
            name,
            interval,
            last_run: self.started_at,
            action,
        });
    }

    /// Run every due task against the context. Returns how many ran.
    ///
    /// A failing action is logged and isolated: it never prevents the
    /// remaining tasks from running in the same tick, and its interval
    /// still advances.
    pub fn tick(&mut self, now: Instant, cx: &mut C) -> usize {
        let mut ran = 0;

        for task in &mut self.tasks {
            if now.saturating_duration_since(task.last_run) < task.interval {
                continue;
            }

            task.last_run = now;
            ran += 1;

            if let Err(e) = (task.action)(now, cx) {
                warn!(task = task.name, error = %e, "dispatch task failed");
            }
        }

        ran
    }

    /// Names of registered tasks, in execution order.
    pub fn task_names(&self) -> Vec<&'static str> {
        self.tasks.iter().map(|t| t.name).collect()
    }
}
