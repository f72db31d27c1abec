// src/exec/mod.rs

//! Task execution layer.
//!
//! The scheduler talks to a [`TaskExecutor`] instead of spawning processes
//! itself. This makes it easy to swap in a fake executor in tests while
//! keeping the production implementation in [`agent`].
//!
//! - [`agent`] runs one spec through an external agent process.
//! - [`record`] parses the structured record the agent must print last.
//! - [`prompt`] builds the task description handed to the agent.
//! - [`timeout`] is a decorator bounding how long one execution may take.

use std::any::Any;
use std::future::Future;
use std::pin::Pin;

use thiserror::Error;
use tokio::task::JoinError;

use crate::engine::Outcome;
use crate::spec::Task;

pub mod agent;
pub mod prompt;
pub mod record;
pub mod timeout;

pub use agent::{AgentExecutor, AgentExecutorConfig};
pub use timeout::TimeoutExecutor;

/// Boxed future returned by [`TaskExecutor::execute`].
pub type ExecuteFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Outcome, ExecutionError>> + Send + 'a>>;

/// Trait abstracting how one task is run to completion.
///
/// A test that fails is an `Ok` outcome with failed status. `Err` is for
/// conditions where no verdict could be produced at all (process could not
/// be spawned, output contract violated); the scheduler turns those into
/// failed outcomes too.
pub trait TaskExecutor: Send + Sync {
    fn execute(&self, task: Task) -> ExecuteFuture<'_>;
}

/// Why an execution produced no verdict.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The agent process could not be started.
    #[error("failed to spawn agent '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The agent exited unsuccessfully without printing a valid record.
    #[error("agent exited with {}: {stderr_tail}", exit_label(.code))]
    ProcessFailed { code: Option<i32>, stderr_tail: String },

    /// The agent's final output line was not a well-formed result record.
    #[error("malformed agent output: {0}")]
    MalformedOutput(String),

    /// IO failure while talking to the agent process.
    #[error("agent IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The executor panicked.
    #[error("executor panicked: {0}")]
    Panicked(String),

    /// The execution was cancelled before it finished.
    #[error("execution cancelled")]
    Cancelled,

    /// Executor-specific failure carrying only a message.
    #[error("{0}")]
    Failed(String),
}

fn exit_label(code: &Option<i32>) -> String {
    match *code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

impl From<JoinError> for ExecutionError {
    fn from(err: JoinError) -> Self {
        if err.is_cancelled() {
            return ExecutionError::Cancelled;
        }
        match err.try_into_panic() {
            Ok(payload) => ExecutionError::Panicked(panic_message(payload)),
            Err(err) => ExecutionError::Failed(err.to_string()),
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
