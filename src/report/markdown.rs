// src/report/markdown.rs

use std::fmt::Write as _;

use crate::engine::OutcomeStatus;
use crate::report::summary::{ReportMeta, Summary, format_duration};

/// Render the run as a Markdown document.
pub fn render_markdown(summary: &Summary, meta: &ReportMeta) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# specpilot test report");
    let _ = writeln!(out);
    let _ = writeln!(out, "- Generated: {}", meta.generated_at.to_rfc3339());
    let _ = writeln!(out, "- Base URL: {}", meta.base_url);
    let _ = writeln!(out, "- Concurrency: {}", meta.concurrency);
    let _ = writeln!(out);

    let _ = writeln!(out, "## Summary");
    let _ = writeln!(out);
    let _ = writeln!(out, "| Metric | Value |");
    let _ = writeln!(out, "| --- | --- |");
    let _ = writeln!(out, "| Total | {} |", summary.total);
    let _ = writeln!(out, "| Passed | {} |", summary.passed);
    let _ = writeln!(out, "| Failed | {} |", summary.failed);
    let _ = writeln!(out, "| Pass rate | {:.1}% |", summary.pass_rate);
    let _ = writeln!(out, "| Total time | {} |", format_duration(summary.total_elapsed));
    if let Some(avg) = summary.average_duration {
        let _ = writeln!(out, "| Average duration | {} |", format_duration(avg));
    }
    if let Some((id, d)) = &summary.slowest {
        let _ = writeln!(out, "| Slowest | `{id}` ({}) |", format_duration(*d));
    }

    if summary.results.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "No tests were run.");
        return out;
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "## Results");

    for outcome in &summary.results {
        let mark = match outcome.status {
            OutcomeStatus::Passed => "PASS",
            OutcomeStatus::Failed => "FAIL",
        };
        let _ = writeln!(out);
        let _ = writeln!(out, "### {mark} `{}`", outcome.id);
        let _ = writeln!(out);

        if let Some(info) = meta.specs.get(&outcome.id) {
            let _ = writeln!(out, "- Name: {}", info.name);
        }
        let _ = writeln!(out, "- Status: {}", outcome.status.as_str());
        let _ = writeln!(out, "- Duration: {}", format_duration(outcome.duration));
        if let Some(info) = meta.specs.get(&outcome.id) {
            if !info.fingerprint.is_empty() {
                let short = &info.fingerprint[..info.fingerprint.len().min(12)];
                let _ = writeln!(out, "- Fingerprint: `{short}`");
            }
        }
        if let Some(err) = &outcome.error {
            let _ = writeln!(out, "- Error: {}", err.replace('\n', " "));
        }
        if let Some(steps) = &outcome.steps_completed {
            if !steps.is_empty() {
                let _ = writeln!(out);
                let _ = writeln!(out, "Completed steps:");
                for step in steps {
                    let _ = writeln!(out, "1. {step}");
                }
            }
        }
    }

    out
}
