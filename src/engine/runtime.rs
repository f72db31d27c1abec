// src/engine/runtime.rs

use std::fmt;
use std::future;
use std::sync::Arc;
use std::time::Instant;

use anyhow::anyhow;
use tokio::sync::oneshot;
use tokio::task::{AbortHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::engine::core::{CoreCommand, CoreStep, SchedulerCore};
use crate::engine::progress::{ProgressSink, ProgressTracker};
use crate::engine::{AggregateResult, Outcome, RuntimeEvent, RuntimeOptions, TaskId};
use crate::errors::{Result, SpecpilotError};
use crate::exec::{ExecutionError, TaskExecutor};
use crate::spec::Task;

type Finished = (TaskId, std::result::Result<Outcome, ExecutionError>);

/// Drives the [`SchedulerCore`] by executing tasks through a
/// [`TaskExecutor`] and feeding completions back as [`RuntimeEvent`]s.
///
/// This is an IO shell around the core, which holds all scheduling
/// semantics. All mutation of the core happens here, on one flow of control,
/// one event at a time; executions only ever report back through their
/// join handles.
pub struct Runtime<E: TaskExecutor + 'static> {
    core: SchedulerCore,
    executor: Arc<E>,
    progress: ProgressTracker,
    options: RuntimeOptions,
    shutdown: Option<oneshot::Receiver<()>>,
    in_flight: JoinSet<Finished>,
}

impl<E: TaskExecutor + 'static> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("options", &self.options)
            .field("in_flight", &self.in_flight.len())
            .finish_non_exhaustive()
    }
}

impl<E: TaskExecutor + 'static> Runtime<E> {
    pub fn new(core: SchedulerCore, executor: E, sink: impl ProgressSink + 'static) -> Self {
        Self {
            core,
            executor: Arc::new(executor),
            progress: ProgressTracker::new(sink),
            options: RuntimeOptions::default(),
            shutdown: None,
            in_flight: JoinSet::new(),
        }
    }

    pub fn with_options(mut self, options: RuntimeOptions) -> Self {
        self.options = options;
        self
    }

    /// Abort the run when `rx` fires. A dropped sender is ignored.
    pub fn with_shutdown(mut self, rx: oneshot::Receiver<()>) -> Self {
        self.shutdown = Some(rx);
        self
    }

    /// Main loop: admit, wait for any in-flight execution, record, refill,
    /// until nothing is pending or running.
    pub async fn run(mut self) -> Result<AggregateResult> {
        if self.core.total() == 0 {
            info!("no tasks to run");
            return Ok(AggregateResult::empty());
        }

        let started = Instant::now();
        let deadline = self.options.deadline.and_then(|d| {
            let at = tokio::time::Instant::now().checked_add(d);
            if at.is_none() {
                warn!(deadline_secs = d.as_secs(), "run deadline too far in the future; ignoring it");
            }
            at
        });

        let step = self.core.start();
        self.apply(step).await;

        while !self.core.is_finished() {
            let event = self.next_event(deadline).await?;
            let step = self.core.step(event);
            self.apply(step).await;
        }

        let aggregate = self.core.into_aggregate(started.elapsed());
        info!(
            total = aggregate.total,
            passed = aggregate.passed_count,
            failed = aggregate.failed_count,
            elapsed_ms = aggregate.total_elapsed.as_millis() as u64,
            "run finished"
        );
        Ok(aggregate)
    }

    /// Wait for whichever happens first: an execution finishing, the
    /// deadline, or a shutdown request.
    async fn next_event(&mut self, deadline: Option<tokio::time::Instant>) -> Result<RuntimeEvent> {
        loop {
            let running = self.core.running_count();
            let woke = {
                let in_flight = &mut self.in_flight;
                let shutdown = &mut self.shutdown;

                // Finished executions win over a deadline or shutdown that
                // became ready in the same poll.
                tokio::select! {
                    biased;
                    joined = in_flight.join_next() => Wake::Joined(joined),
                    _ = sleep_until_deadline(deadline) => Wake::Deadline,
                    requested = wait_shutdown(shutdown) => Wake::Shutdown(requested),
                }
            };

            match woke {
                Wake::Joined(Some(Ok((task, result)))) => {
                    return Ok(RuntimeEvent::TaskFinished { task, result });
                }
                // The wrapper task never panics and is only aborted after
                // the core recorded its outcome.
                Wake::Joined(Some(Err(err))) => {
                    debug!(error = %err, "in-flight wrapper ended without a result");
                }
                Wake::Joined(None) => {
                    return Err(SpecpilotError::Other(anyhow!(
                        "scheduler stalled: {running} tasks running but nothing in flight"
                    )));
                }
                Wake::Deadline => return Ok(RuntimeEvent::DeadlineExceeded),
                Wake::Shutdown(true) => return Ok(RuntimeEvent::ShutdownRequested),
                Wake::Shutdown(false) => {
                    debug!("shutdown sender dropped; no longer listening for shutdown");
                    self.shutdown = None;
                }
            }
        }
    }

    async fn apply(&mut self, step: CoreStep) {
        for command in step.commands {
            match command {
                CoreCommand::Dispatch(tasks) => self.dispatch(tasks),
                CoreCommand::EmitProgress(snapshot) => {
                    self.progress.publish(snapshot);
                }
                CoreCommand::AbortInFlight => {
                    warn!(in_flight = self.in_flight.len(), "aborting in-flight executions");
                    self.in_flight.shutdown().await;
                }
            }
        }
    }

    fn dispatch(&mut self, tasks: Vec<Task>) {
        for task in tasks {
            let id = task.id.clone();
            let executor = Arc::clone(&self.executor);
            debug!(task = %id, "dispatching task");

            self.in_flight.spawn(async move {
                // Run the executor in its own task so that a panic, even one
                // raised before its future exists, surfaces as a JoinError
                // for this task alone.
                let inner = tokio::spawn(async move { executor.execute(task).await });
                let guard = AbortOnDrop(inner.abort_handle());
                let result = match inner.await {
                    Ok(result) => result,
                    Err(err) => Err(ExecutionError::from(err)),
                };
                drop(guard);
                (id, result)
            });
        }
    }
}

enum Wake {
    Joined(Option<std::result::Result<Finished, tokio::task::JoinError>>),
    Deadline,
    Shutdown(bool),
}

/// Aborts the inner execution if the wrapper is dropped (run deadline,
/// shutdown), so executor resources like child processes are released.
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

async fn sleep_until_deadline(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => future::pending().await,
    }
}

/// `true` when shutdown was requested, `false` when the sender went away.
async fn wait_shutdown(shutdown: &mut Option<oneshot::Receiver<()>>) -> bool {
    match shutdown {
        Some(rx) => rx.await.is_ok(),
        None => future::pending().await,
    }
}
