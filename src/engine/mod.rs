// src/engine/mod.rs

//! Worker orchestration.
//!
//! - [`budget`] turns the size of a change set into per-worker timeouts.
//! - [`state`] is the small cache carried between runs.
//! - [`scheduler`] takes a lock per worker, runs the workers concurrently
//!   and reports one [`WorkerOutcome`] each.

use std::fmt;
use std::time::Duration;

pub mod budget;
pub mod scheduler;
pub mod state;

pub use budget::{BudgetPlan, TimeoutBudget};
pub use scheduler::{DispatchContext, Scheduler};
pub use state::OrchestratorCache;

/// Canonical worker name type used throughout the engine.
pub type WorkerName = String;

/// How a dispatched (or skipped) worker ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerOutcome {
    /// Finished successfully with this output.
    Completed(String),
    /// Returned an error or panicked.
    Failed(String),
    /// Exceeded its budget and was abandoned.
    TimedOut(Duration),
    /// Another process holds the worker's lock.
    AlreadyRunning,
    /// The lock could not be taken for a reason other than contention.
    LockUnavailable(String),
}

impl WorkerOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, WorkerOutcome::Completed(_))
    }

    /// Whether the worker was actually started.
    pub fn was_dispatched(&self) -> bool {
        !matches!(
            self,
            WorkerOutcome::AlreadyRunning | WorkerOutcome::LockUnavailable(_)
        )
    }
}

impl fmt::Display for WorkerOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerOutcome::Completed(_) => f.write_str("completed"),
            WorkerOutcome::Failed(reason) => write!(f, "failed: {reason}"),
            WorkerOutcome::TimedOut(budget) => write!(f, "timed out after {}s", budget.as_secs()),
            WorkerOutcome::AlreadyRunning => f.write_str("already running"),
            WorkerOutcome::LockUnavailable(reason) => write!(f, "lock unavailable: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    pub name: WorkerName,
    pub outcome: WorkerOutcome,
    pub elapsed: Duration,
}
