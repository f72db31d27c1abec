// src/report/mod.rs

//! Turning an [`AggregateResult`](crate::engine::AggregateResult) into
//! something people read: summary statistics, Markdown / JSON documents and
//! the short console summary printed at the end of a run.

pub mod json;
pub mod markdown;
pub mod summary;
pub mod writer;

use std::fmt::Write as _;

pub use json::render_json;
pub use markdown::render_markdown;
pub use summary::{ReportMeta, SpecInfo, Summary, format_duration};
pub use writer::{report_file_name, write_report};

/// Short plain-text summary for stdout.
pub fn render_console(summary: &Summary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} passed, {} failed, {} total ({:.1}%) in {}",
        summary.passed,
        summary.failed,
        summary.total,
        summary.pass_rate,
        format_duration(summary.total_elapsed)
    );
    for outcome in summary.failures() {
        let _ = writeln!(
            out,
            "  FAIL {}: {}",
            outcome.id,
            outcome.error.as_deref().unwrap_or("failed")
        );
    }
    out
}
