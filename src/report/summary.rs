// src/report/summary.rs

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::engine::{AggregateResult, Outcome, TaskId};
use crate::spec::Task;

/// Presentation view of one run, derived from an [`AggregateResult`].
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Percentage of passed tasks, `0.0` for an empty run.
    pub pass_rate: f64,
    pub total_elapsed: Duration,
    pub average_duration: Option<Duration>,
    pub slowest: Option<(TaskId, Duration)>,
    /// Outcomes sorted by identifier.
    pub results: Vec<Outcome>,
}

impl Summary {
    pub fn from_aggregate(aggregate: &AggregateResult) -> Self {
        let mut results = aggregate.results.clone();
        results.sort_by(|a, b| a.id.cmp(&b.id));

        let pass_rate = if aggregate.total == 0 {
            0.0
        } else {
            aggregate.passed_count as f64 * 100.0 / aggregate.total as f64
        };

        let average_duration = if results.is_empty() {
            None
        } else {
            let sum: Duration = results.iter().map(|o| o.duration).sum();
            Some(sum / results.len() as u32)
        };

        // Ties keep the first identifier in sorted order.
        let slowest = results
            .iter()
            .fold(None::<&Outcome>, |best, o| match best {
                Some(b) if b.duration >= o.duration => Some(b),
                _ => Some(o),
            })
            .map(|o| (o.id.clone(), o.duration));

        Self {
            total: aggregate.total,
            passed: aggregate.passed_count,
            failed: aggregate.failed_count,
            pass_rate,
            total_elapsed: aggregate.total_elapsed,
            average_duration,
            slowest,
            results,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &Outcome> {
        self.results.iter().filter(|o| !o.is_passed())
    }
}

/// Per-spec details echoed into the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecInfo {
    pub name: String,
    pub fingerprint: String,
}

/// Context of a run that is not part of the outcomes themselves.
#[derive(Debug, Clone)]
pub struct ReportMeta {
    pub generated_at: DateTime<Utc>,
    pub base_url: String,
    pub concurrency: usize,
    pub specs: BTreeMap<TaskId, SpecInfo>,
}

impl ReportMeta {
    pub fn new(base_url: impl Into<String>, concurrency: usize) -> Self {
        Self {
            generated_at: Utc::now(),
            base_url: base_url.into(),
            concurrency,
            specs: BTreeMap::new(),
        }
    }

    pub fn with_generated_at(mut self, at: DateTime<Utc>) -> Self {
        self.generated_at = at;
        self
    }

    pub fn with_tasks(mut self, tasks: &[Task]) -> Self {
        for task in tasks {
            self.specs.insert(
                task.id.clone(),
                SpecInfo {
                    name: task.spec.display_name().to_string(),
                    fingerprint: task.fingerprint.clone(),
                },
            );
        }
        self
    }
}

/// Human-readable duration: `850ms`, `12.3s`, `2m 05s`.
pub fn format_duration(d: Duration) -> String {
    let millis = d.as_millis();
    if millis < 1000 {
        format!("{millis}ms")
    } else if millis < 60_000 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        let secs = d.as_secs();
        format!("{}m {:02}s", secs / 60, secs % 60)
    }
}
