use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use specpilot::engine::{Outcome, TaskId};
use specpilot::exec::{ExecuteFuture, ExecutionError, TaskExecutor};
use specpilot::spec::Task;

/// What the fake does when asked to execute a given task.
#[derive(Debug, Clone)]
pub enum Behaviour {
    /// Resolve with a passed outcome after `delay`.
    Pass(Duration),
    /// Resolve with a failed outcome carrying `error` after `delay`.
    Fail(Duration, String),
    /// Reject with `ExecutionError::Failed(message)` after `delay`.
    Error(Duration, String),
    /// Panic inside the returned future.
    Panic,
    /// Panic while building the future, before anything is awaited.
    PanicOnCall,
    /// Never finish.
    Hang,
}

#[derive(Debug, Default)]
struct Stats {
    current: AtomicUsize,
    max: AtomicUsize,
    started: Mutex<Vec<TaskId>>,
    finished: Mutex<Vec<TaskId>>,
}

/// A scripted executor for scheduler tests.
///
/// - per-task behaviour via [`FakeExecutor::with`]; unscripted tasks pass
///   immediately
/// - records start / finish order
/// - tracks how many executions overlap, including ones that get aborted
#[derive(Debug, Clone, Default)]
pub struct FakeExecutor {
    script: Arc<Mutex<HashMap<TaskId, Behaviour>>>,
    stats: Arc<Stats>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, id: &str, behaviour: Behaviour) -> Self {
        self.script
            .lock()
            .unwrap()
            .insert(id.to_string(), behaviour);
        self
    }

    /// Identifiers in the order their executions started.
    pub fn started(&self) -> Vec<TaskId> {
        self.stats.started.lock().unwrap().clone()
    }

    /// Identifiers whose executions ran to the end, in order.
    pub fn finished(&self) -> Vec<TaskId> {
        self.stats.finished.lock().unwrap().clone()
    }

    /// Highest number of executions observed running at once.
    pub fn max_concurrency(&self) -> usize {
        self.stats.max.load(Ordering::SeqCst)
    }

    /// Executions currently in progress (aborted ones are not counted).
    pub fn current_concurrency(&self) -> usize {
        self.stats.current.load(Ordering::SeqCst)
    }

    fn behaviour_for(&self, id: &str) -> Behaviour {
        self.script
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .unwrap_or(Behaviour::Pass(Duration::ZERO))
    }
}

/// Decrements the in-progress counter however the execution ends.
struct InFlight(Arc<Stats>);

impl InFlight {
    fn enter(stats: &Arc<Stats>) -> Self {
        let now = stats.current.fetch_add(1, Ordering::SeqCst) + 1;
        stats.max.fetch_max(now, Ordering::SeqCst);
        InFlight(Arc::clone(stats))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.current.fetch_sub(1, Ordering::SeqCst);
    }
}

impl TaskExecutor for FakeExecutor {
    fn execute(&self, task: Task) -> ExecuteFuture<'_> {
        let behaviour = self.behaviour_for(&task.id);
        if let Behaviour::PanicOnCall = behaviour {
            panic!("fake executor panicked while starting {}", task.id);
        }

        let stats = Arc::clone(&self.stats);
        Box::pin(async move {
            let id = task.id;
            stats.started.lock().unwrap().push(id.clone());
            let _in_flight = InFlight::enter(&stats);

            let result = match behaviour {
                Behaviour::Pass(delay) => {
                    tokio::time::sleep(delay).await;
                    Ok(Outcome::passed(id.clone(), delay))
                }
                Behaviour::Fail(delay, error) => {
                    tokio::time::sleep(delay).await;
                    Ok(Outcome::failed(id.clone(), delay, error))
                }
                Behaviour::Error(delay, message) => {
                    tokio::time::sleep(delay).await;
                    Err(ExecutionError::Failed(message))
                }
                Behaviour::Panic => panic!("fake executor panicked while running {id}"),
                Behaviour::Hang => std::future::pending().await,
                Behaviour::PanicOnCall => unreachable!(),
            };

            stats.finished.lock().unwrap().push(id);
            result
        })
    }
}
