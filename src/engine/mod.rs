// src/engine/mod.rs

//! Scheduling engine for specpilot.
//!
//! This module ties together:
//! - the pending queue / running table / results of one run
//! - admission of queued tasks whenever capacity frees up
//! - normalization of executor results into [`Outcome`]s
//! - progress snapshots for the console and logs
//!
//! The pure core state machine lives in [`core`]; the async/IO shell that
//! multiplexes in-flight executions is implemented in [`runtime`].

use std::time::{Duration, Instant};

use crate::errors::Result;
use crate::exec::{ExecutionError, TaskExecutor};
use crate::spec::Task;

/// Canonical task identifier type used throughout the engine.
pub type TaskId = String;

/// Terminal status of one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Passed,
    Failed,
}

impl OutcomeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OutcomeStatus::Passed => "passed",
            OutcomeStatus::Failed => "failed",
        }
    }
}

/// Terminal, immutable result of one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub id: TaskId,
    pub status: OutcomeStatus,
    pub duration: Duration,
    pub error: Option<String>,
    /// Step descriptions the agent reported as completed, if it reported any.
    pub steps_completed: Option<Vec<String>>,
}

impl Outcome {
    pub fn passed(id: impl Into<TaskId>, duration: Duration) -> Self {
        Self {
            id: id.into(),
            status: OutcomeStatus::Passed,
            duration,
            error: None,
            steps_completed: None,
        }
    }

    pub fn failed(id: impl Into<TaskId>, duration: Duration, error: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: OutcomeStatus::Failed,
            duration,
            error: Some(error.into()),
            steps_completed: None,
        }
    }

    pub fn with_steps(mut self, steps: Vec<String>) -> Self {
        self.steps_completed = Some(steps);
        self
    }

    pub fn is_passed(&self) -> bool {
        self.status == OutcomeStatus::Passed
    }
}

/// A task that has been admitted and has not produced its outcome yet.
#[derive(Debug, Clone)]
pub struct RunningEntry {
    pub id: TaskId,
    pub started_at: Instant,
}

/// Final result of a scheduling run.
///
/// `passed_count + failed_count == total == results.len()` always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateResult {
    pub total: usize,
    pub passed_count: usize,
    pub failed_count: usize,
    /// Outcomes in completion order.
    pub results: Vec<Outcome>,
    pub total_elapsed: Duration,
}

impl AggregateResult {
    pub fn from_results(results: Vec<Outcome>, total_elapsed: Duration) -> Self {
        let passed_count = results.iter().filter(|o| o.is_passed()).count();
        Self {
            total: results.len(),
            passed_count,
            failed_count: results.len() - passed_count,
            results,
            total_elapsed,
        }
    }

    pub fn empty() -> Self {
        Self::from_results(Vec::new(), Duration::ZERO)
    }

    pub fn all_passed(&self) -> bool {
        self.failed_count == 0
    }
}

/// Runtime options used by the async shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// Whole-run deadline. When it expires, in-flight tasks are aborted and
    /// every unfinished task is recorded as failed.
    pub deadline: Option<Duration>,
}

/// Events flowing into the core from the async shell.
#[derive(Debug)]
pub enum RuntimeEvent {
    /// An in-flight execution finished, successfully or not.
    TaskFinished {
        task: TaskId,
        result: std::result::Result<Outcome, ExecutionError>,
    },
    /// The run deadline elapsed.
    DeadlineExceeded,
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod progress;
pub mod runtime;

pub use core::{CoreCommand, CoreStep, SchedulerCore};
pub use progress::{ConsoleProgress, LogProgress, ProgressSink, ProgressSnapshot, ProgressTracker};
pub use runtime::Runtime;

/// Run `tasks` with at most `concurrency_limit` executing at once.
///
/// Fails only for run-level problems (invalid limit, duplicate identifiers);
/// every per-task failure is recorded in the returned aggregate.
pub async fn run_tasks<E, S>(
    tasks: Vec<Task>,
    concurrency_limit: usize,
    executor: E,
    sink: S,
) -> Result<AggregateResult>
where
    E: TaskExecutor + 'static,
    S: ProgressSink + 'static,
{
    let core = SchedulerCore::new(tasks, concurrency_limit)?;
    Runtime::new(core, executor, sink).run().await
}
