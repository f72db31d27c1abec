// src/engine/progress.rs

//! Progress snapshots and where they go.

use std::fmt;

use tracing::info;

/// Point-in-time summary of a run.
///
/// `completed + running + queued == total` at every emitted snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressSnapshot {
    pub completed: usize,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub running: usize,
    pub queued: usize,
}

impl fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}/{}] passed={} failed={} running={} queued={}",
            self.completed, self.total, self.passed, self.failed, self.running, self.queued
        )
    }
}

/// Receiver of progress snapshots.
///
/// Any `FnMut(&ProgressSnapshot) + Send` closure is a sink, which is what
/// tests usually pass.
pub trait ProgressSink: Send {
    fn emit(&mut self, snapshot: &ProgressSnapshot);
}

impl<F> ProgressSink for F
where
    F: FnMut(&ProgressSnapshot) + Send,
{
    fn emit(&mut self, snapshot: &ProgressSnapshot) {
        self(snapshot)
    }
}

/// Sink that logs each snapshot via `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn emit(&mut self, s: &ProgressSnapshot) {
        info!(
            completed = s.completed,
            total = s.total,
            passed = s.passed,
            failed = s.failed,
            running = s.running,
            queued = s.queued,
            "progress"
        );
    }
}

/// Sink that prints one status line per snapshot on stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn emit(&mut self, snapshot: &ProgressSnapshot) {
        eprintln!("specpilot {snapshot}");
    }
}

/// Forwards snapshots to a sink, dropping a snapshot identical to the one
/// emitted just before it.
pub struct ProgressTracker {
    sink: Box<dyn ProgressSink>,
    last: Option<ProgressSnapshot>,
}

impl fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("last", &self.last)
            .finish_non_exhaustive()
    }
}

impl ProgressTracker {
    pub fn new(sink: impl ProgressSink + 'static) -> Self {
        Self {
            sink: Box::new(sink),
            last: None,
        }
    }

    /// Returns whether the snapshot was forwarded.
    pub fn publish(&mut self, snapshot: ProgressSnapshot) -> bool {
        if self.last == Some(snapshot) {
            return false;
        }
        self.sink.emit(&snapshot);
        self.last = Some(snapshot);
        true
    }

    pub fn last(&self) -> Option<ProgressSnapshot> {
        self.last
    }
}
