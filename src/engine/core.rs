// src/engine/core.rs

//! Pure core scheduler state machine.
//!
//! This module contains a synchronous, deterministic "core" that owns the
//! three collections of a run (pending queue, running table, results) and
//! consumes [`RuntimeEvent`]s, producing:
//! - an updated core state
//! - a list of [`CoreCommand`]s describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::Runtime`) is responsible for:
//! - actually invoking the executor for dispatched tasks
//! - waiting for whichever in-flight execution finishes first
//! - the run deadline and Ctrl+C
//!
//! The core has no channels, no Tokio types and performs no IO, so it can be
//! driven step by step from tests.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::engine::progress::ProgressSnapshot;
use crate::engine::{AggregateResult, Outcome, RunningEntry, RuntimeEvent, TaskId};
use crate::errors::{Result, SpecpilotError};
use crate::exec::ExecutionError;
use crate::spec::Task;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Start executing these tasks.
    Dispatch(Vec<Task>),
    /// Publish a progress snapshot.
    EmitProgress(ProgressSnapshot),
    /// Stop every in-flight execution; their outcomes have already been
    /// recorded as failed.
    AbortInFlight,
}

/// Decision returned by the core after one transition.
#[derive(Debug, Clone)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// False once pending and running are both empty.
    pub keep_running: bool,
}

#[derive(Debug)]
pub struct SchedulerCore {
    limit: usize,
    total: usize,
    pending: VecDeque<Task>,
    running: BTreeMap<TaskId, RunningEntry>,
    results: Vec<Outcome>,
}

impl SchedulerCore {
    /// Build the initial state: every task pending, in input order.
    ///
    /// Fails with a configuration error if `limit` is zero or if two tasks
    /// share an identifier.
    pub fn new(tasks: Vec<Task>, limit: usize) -> Result<Self> {
        if limit == 0 {
            return Err(SpecpilotError::ConfigError(
                "concurrency limit must be >= 1 (got 0)".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for task in &tasks {
            if !seen.insert(task.id.as_str()) {
                return Err(SpecpilotError::ConfigError(format!(
                    "duplicate task identifier '{}'",
                    task.id
                )));
            }
        }

        Ok(Self {
            limit,
            total: tasks.len(),
            pending: tasks.into(),
            running: BTreeMap::new(),
            results: Vec::new(),
        })
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of tasks the run was created with.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn running_count(&self) -> usize {
        self.running.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Identifiers currently running, sorted.
    pub fn running_ids(&self) -> Vec<TaskId> {
        self.running.keys().cloned().collect()
    }

    /// Outcomes recorded so far, in completion order.
    pub fn results(&self) -> &[Outcome] {
        &self.results
    }

    /// True once nothing is pending and nothing is running.
    pub fn is_finished(&self) -> bool {
        self.pending.is_empty() && self.running.is_empty()
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let passed = self.results.iter().filter(|o| o.is_passed()).count();
        ProgressSnapshot {
            completed: self.results.len(),
            total: self.total,
            passed,
            failed: self.results.len() - passed,
            running: self.running.len(),
            queued: self.pending.len(),
        }
    }

    /// Initial admission pass.
    pub fn start(&mut self) -> CoreStep {
        info!(
            total = self.total,
            limit = self.limit,
            "scheduler: starting run"
        );
        let mut commands = Vec::new();
        self.admit_into(&mut commands);
        commands.push(CoreCommand::EmitProgress(self.snapshot()));
        self.finish_step(commands)
    }

    /// Handle a single runtime event.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::TaskFinished { task, result } => self.handle_completion(task, result),
            RuntimeEvent::DeadlineExceeded => self.abort("run deadline exceeded"),
            RuntimeEvent::ShutdownRequested => self.abort("run cancelled"),
        }
    }

    /// Record every unfinished task as failed with `reason` and stop.
    ///
    /// Running tasks keep the time they had been running for; pending tasks
    /// get a zero duration.
    pub fn abort(&mut self, reason: &str) -> CoreStep {
        let mut commands = Vec::new();
        if self.is_finished() {
            return self.finish_step(commands);
        }

        warn!(
            reason,
            running = self.running.len(),
            queued = self.pending.len(),
            "scheduler: aborting unfinished tasks"
        );

        let had_running = !self.running.is_empty();
        for (id, entry) in std::mem::take(&mut self.running) {
            self.results
                .push(Outcome::failed(id, entry.started_at.elapsed(), reason));
        }
        while let Some(task) = self.pending.pop_front() {
            self.results.push(Outcome::failed(
                task.id,
                Duration::ZERO,
                format!("not started: {reason}"),
            ));
        }

        if had_running {
            commands.push(CoreCommand::AbortInFlight);
        }
        commands.push(CoreCommand::EmitProgress(self.snapshot()));
        self.finish_step(commands)
    }

    /// Consume the finished core into the run's aggregate.
    pub fn into_aggregate(self, total_elapsed: Duration) -> AggregateResult {
        debug_assert!(self.is_finished(), "aggregate requested before run finished");
        AggregateResult::from_results(self.results, total_elapsed)
    }

    fn handle_completion(
        &mut self,
        task: TaskId,
        result: std::result::Result<Outcome, ExecutionError>,
    ) -> CoreStep {
        let mut commands = Vec::new();

        let Some(entry) = self.running.remove(&task) else {
            warn!(task = %task, "completion for task that is not running; ignoring");
            return self.finish_step(commands);
        };

        let outcome = normalize(&entry, result);
        info!(
            task = %outcome.id,
            status = outcome.status.as_str(),
            duration_ms = outcome.duration.as_millis() as u64,
            "task finished"
        );
        self.results.push(outcome);
        commands.push(CoreCommand::EmitProgress(self.snapshot()));

        if self.admit_into(&mut commands) {
            commands.push(CoreCommand::EmitProgress(self.snapshot()));
        }

        self.finish_step(commands)
    }

    /// Admission transition: move tasks from pending to running while there
    /// is capacity. Returns whether anything was admitted.
    fn admit_into(&mut self, commands: &mut Vec<CoreCommand>) -> bool {
        let mut admitted = Vec::new();

        while self.running.len() < self.limit {
            let Some(task) = self.pending.pop_front() else {
                break;
            };
            debug!(
                task = %task.id,
                running = self.running.len() + 1,
                queued = self.pending.len(),
                "admitting task"
            );
            self.running.insert(
                task.id.clone(),
                RunningEntry {
                    id: task.id.clone(),
                    started_at: Instant::now(),
                },
            );
            admitted.push(task);
        }

        if admitted.is_empty() {
            return false;
        }
        commands.push(CoreCommand::Dispatch(admitted));
        true
    }

    fn finish_step(&self, commands: Vec<CoreCommand>) -> CoreStep {
        CoreStep {
            commands,
            keep_running: !self.is_finished(),
        }
    }
}

/// Turn an executor result into the task's outcome.
///
/// A resolved outcome is used as-is (its identifier is pinned to the running
/// entry); an error becomes a failed outcome with zero duration.
fn normalize(
    entry: &RunningEntry,
    result: std::result::Result<Outcome, ExecutionError>,
) -> Outcome {
    match result {
        Ok(mut outcome) => {
            if outcome.id != entry.id {
                warn!(
                    task = %entry.id,
                    reported = %outcome.id,
                    "executor returned outcome with a different identifier; using the scheduled one"
                );
                outcome.id = entry.id.clone();
            }
            outcome
        }
        Err(err) => {
            warn!(task = %entry.id, error = %err, "task execution errored");
            Outcome::failed(entry.id.clone(), Duration::ZERO, err.to_string())
        }
    }
}
