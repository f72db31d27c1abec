#![allow(dead_code)]

pub use specpilot_test_utils::{init_tracing, recording_sink, with_timeout};

use specpilot::engine::ProgressSnapshot;

/// Minimal valid spec file contents.
pub fn spec_toml(goal: &str, start_url: &str) -> String {
    format!(
        r#"goal = "{goal}"
start_url = "{start_url}"
steps = ["Open the page", "Check the result"]
"#
    )
}

/// Assert the bookkeeping invariants every emitted snapshot must satisfy.
pub fn assert_snapshot_invariants(snapshots: &[ProgressSnapshot], total: usize, limit: usize) {
    let mut last_completed = 0;
    for s in snapshots {
        assert_eq!(s.total, total, "total changed: {s}");
        assert_eq!(
            s.completed + s.running + s.queued,
            total,
            "completed + running + queued != total: {s}"
        );
        assert_eq!(s.passed + s.failed, s.completed, "passed + failed != completed: {s}");
        assert!(s.running <= limit, "running exceeds limit {limit}: {s}");
        assert!(s.completed >= last_completed, "completed went backwards: {s}");
        last_completed = s.completed;
    }
    for pair in snapshots.windows(2) {
        assert_ne!(pair[0], pair[1], "identical consecutive snapshots emitted");
    }
}
