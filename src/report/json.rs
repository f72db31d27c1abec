// src/report/json.rs

use serde::Serialize;

use crate::errors::Result;
use crate::report::summary::{ReportMeta, Summary};

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    base_url: &'a str,
    concurrency: usize,
    summary: JsonSummary<'a>,
    results: Vec<JsonResult<'a>>,
}

#[derive(Debug, Serialize)]
struct JsonSummary<'a> {
    total: usize,
    passed: usize,
    failed: usize,
    pass_rate: f64,
    total_elapsed_ms: u64,
    average_duration_ms: Option<u64>,
    slowest: Option<JsonSlowest<'a>>,
}

#[derive(Debug, Serialize)]
struct JsonSlowest<'a> {
    id: &'a str,
    duration_ms: u64,
}

#[derive(Debug, Serialize)]
struct JsonResult<'a> {
    id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    status: &'static str,
    duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    steps_completed: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fingerprint: Option<&'a str>,
}

/// Render the run as a pretty-printed JSON document.
pub fn render_json(summary: &Summary, meta: &ReportMeta) -> Result<String> {
    let results = summary
        .results
        .iter()
        .map(|o| {
            let info = meta.specs.get(&o.id);
            JsonResult {
                id: &o.id,
                name: info.map(|i| i.name.as_str()),
                status: o.status.as_str(),
                duration_ms: o.duration.as_millis() as u64,
                error: o.error.as_deref(),
                steps_completed: o.steps_completed.as_deref(),
                fingerprint: info
                    .map(|i| i.fingerprint.as_str())
                    .filter(|f| !f.is_empty()),
            }
        })
        .collect();

    let report = JsonReport {
        generated_at: meta.generated_at.to_rfc3339(),
        base_url: &meta.base_url,
        concurrency: meta.concurrency,
        summary: JsonSummary {
            total: summary.total,
            passed: summary.passed,
            failed: summary.failed,
            pass_rate: summary.pass_rate,
            total_elapsed_ms: summary.total_elapsed.as_millis() as u64,
            average_duration_ms: summary.average_duration.map(|d| d.as_millis() as u64),
            slowest: summary.slowest.as_ref().map(|(id, d)| JsonSlowest {
                id,
                duration_ms: d.as_millis() as u64,
            }),
        },
        results,
    };

    let mut rendered = serde_json::to_string_pretty(&report)?;
    rendered.push('\n');
    Ok(rendered)
}
