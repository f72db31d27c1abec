// src/exec/timeout.rs

use std::time::{Duration, Instant};

use tracing::warn;

use crate::engine::Outcome;
use crate::exec::{ExecuteFuture, TaskExecutor};
use crate::spec::Task;

/// Decorator bounding each execution of the wrapped executor.
///
/// The limit is `metadata.timeout_secs` of the spec when set, otherwise the
/// decorator's default; with neither, the execution is unbounded. On expiry
/// the inner future is dropped (killing an agent child process) and the
/// task resolves as failed.
#[derive(Debug, Clone)]
pub struct TimeoutExecutor<E> {
    inner: E,
    default_timeout: Option<Duration>,
}

impl<E: TaskExecutor> TimeoutExecutor<E> {
    pub fn new(inner: E, default_timeout: Option<Duration>) -> Self {
        Self {
            inner,
            default_timeout,
        }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    /// Effective limit for `task`.
    pub fn timeout_for(&self, task: &Task) -> Option<Duration> {
        task.spec
            .metadata
            .timeout_secs
            .map(Duration::from_secs)
            .or(self.default_timeout)
    }
}

impl<E: TaskExecutor> TaskExecutor for TimeoutExecutor<E> {
    fn execute(&self, task: Task) -> ExecuteFuture<'_> {
        let limit = self.timeout_for(&task);
        Box::pin(async move {
            let Some(limit) = limit else {
                return self.inner.execute(task).await;
            };

            let id = task.id.clone();
            let started = Instant::now();
            match tokio::time::timeout(limit, self.inner.execute(task)).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(task = %id, limit_secs = limit.as_secs_f64(), "task timed out");
                    Ok(Outcome::failed(
                        id,
                        started.elapsed(),
                        format!("timed out after {}", format_limit(limit)),
                    ))
                }
            }
        })
    }
}

fn format_limit(limit: Duration) -> String {
    if limit.subsec_millis() == 0 {
        format!("{}s", limit.as_secs())
    } else {
        format!("{}ms", limit.as_millis())
    }
}
