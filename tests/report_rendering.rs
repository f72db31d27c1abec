// tests/report_rendering.rs

use std::path::Path;
use std::time::Duration;

use chrono::{TimeZone, Utc};

use specpilot::engine::{AggregateResult, Outcome};
use specpilot::fs::FileSystem;
use specpilot::fs::RealFileSystem;
use specpilot::fs::mock::MockFileSystem;
use specpilot::report::{
    ReportMeta, Summary, format_duration, render_console, render_json, render_markdown,
    report_file_name, write_report,
};
use specpilot::types::ReportFormat;
use specpilot_test_utils::builders::TestSpecBuilder;

fn sample_aggregate() -> AggregateResult {
    AggregateResult::from_results(
        vec![
            Outcome::passed("checkout/pay", Duration::from_millis(1200))
                .with_steps(vec!["Open cart".to_string(), "Pay".to_string()]),
            Outcome::failed("auth/login", Duration::from_millis(3400), "Dashboard not visible"),
            Outcome::passed("auth/signup", Duration::from_millis(800)),
        ],
        Duration::from_secs(5),
    )
}

fn sample_meta() -> ReportMeta {
    let mut login = TestSpecBuilder::new("User can log in").name("Login").task("auth/login");
    login.fingerprint = "0123456789abcdef0123".to_string();

    ReportMeta::new("http://localhost:3000", 2)
        .with_generated_at(Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap())
        .with_tasks(&[login])
}

#[test]
fn summary_statistics() {
    let summary = Summary::from_aggregate(&sample_aggregate());

    assert_eq!(summary.total, 3);
    assert_eq!(summary.passed, 2);
    assert_eq!(summary.failed, 1);
    assert!((summary.pass_rate - 66.666).abs() < 0.01);
    assert_eq!(summary.total_elapsed, Duration::from_secs(5));
    assert_eq!(
        summary.average_duration,
        Some(Duration::from_millis((1200 + 3400 + 800) / 3))
    );
    assert_eq!(
        summary.slowest,
        Some(("auth/login".to_string(), Duration::from_millis(3400)))
    );
    assert!(!summary.all_passed());

    let ids: Vec<_> = summary.results.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ids, vec!["auth/login", "auth/signup", "checkout/pay"]);

    let failures: Vec<_> = summary.failures().map(|o| o.id.as_str()).collect();
    assert_eq!(failures, vec!["auth/login"]);
}

#[test]
fn empty_summary_has_zero_pass_rate() {
    let summary = Summary::from_aggregate(&AggregateResult::empty());

    assert_eq!(summary.total, 0);
    assert_eq!(summary.pass_rate, 0.0);
    assert_eq!(summary.average_duration, None);
    assert_eq!(summary.slowest, None);
    assert!(summary.all_passed());
}

#[test]
fn markdown_report_contains_summary_and_details() {
    let summary = Summary::from_aggregate(&sample_aggregate());

    let md = render_markdown(&summary, &sample_meta());

    assert!(md.starts_with("# specpilot test report"));
    assert!(md.contains("- Base URL: http://localhost:3000"));
    assert!(md.contains("- Concurrency: 2"));
    assert!(md.contains("2026-03-14T09:26:53"));
    assert!(md.contains("| Total | 3 |"));
    assert!(md.contains("| Passed | 2 |"));
    assert!(md.contains("| Failed | 1 |"));
    assert!(md.contains("| Pass rate | 66.7% |"));
    assert!(md.contains("### FAIL `auth/login`"));
    assert!(md.contains("- Name: Login"));
    assert!(md.contains("- Error: Dashboard not visible"));
    assert!(md.contains("- Fingerprint: `0123456789ab`"));
    assert!(md.contains("### PASS `checkout/pay`"));
    assert!(md.contains("1. Open cart"));

    // Sorted by identifier.
    let login = md.find("`auth/login`").unwrap();
    let pay = md.find("### PASS `checkout/pay`").unwrap();
    assert!(login < pay);
}

#[test]
fn markdown_report_for_an_empty_run() {
    let summary = Summary::from_aggregate(&AggregateResult::empty());

    let md = render_markdown(&summary, &ReportMeta::new("http://x", 1));

    assert!(md.contains("| Total | 0 |"));
    assert!(md.contains("No tests were run."));
}

#[test]
fn json_report_is_machine_readable() {
    let summary = Summary::from_aggregate(&sample_aggregate());

    let rendered = render_json(&summary, &sample_meta()).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&rendered).unwrap();

    assert_eq!(doc["base_url"], "http://localhost:3000");
    assert_eq!(doc["concurrency"], 2);
    assert_eq!(doc["summary"]["total"], 3);
    assert_eq!(doc["summary"]["passed"], 2);
    assert_eq!(doc["summary"]["failed"], 1);
    assert_eq!(doc["summary"]["slowest"]["id"], "auth/login");
    assert_eq!(doc["summary"]["total_elapsed_ms"], 5000);

    let results = doc["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["id"], "auth/login");
    assert_eq!(results[0]["status"], "failed");
    assert_eq!(results[0]["error"], "Dashboard not visible");
    assert_eq!(results[0]["name"], "Login");
    assert_eq!(results[0]["duration_ms"], 3400);
    assert!(results[1].get("error").is_none());
    assert_eq!(results[2]["steps_completed"][1], "Pay");
}

#[test]
fn report_file_name_uses_the_generation_timestamp() {
    let meta = sample_meta();

    assert_eq!(
        report_file_name(&meta, ReportFormat::Markdown),
        "report-20260314_092653_000.md"
    );
    assert_eq!(
        report_file_name(&meta, ReportFormat::Json),
        "report-20260314_092653_000.json"
    );
}

#[test]
fn write_report_through_the_filesystem_seam() {
    let fs = MockFileSystem::new();
    let summary = Summary::from_aggregate(&sample_aggregate());

    let path = write_report(
        &fs,
        Path::new("reports"),
        ReportFormat::Json,
        &summary,
        &sample_meta(),
    )
    .unwrap();

    assert_eq!(path, Path::new("reports/report-20260314_092653_000.json"));
    let written = fs.read_to_string(&path).unwrap();
    assert!(written.contains("\"auth/login\""));
}

#[test]
fn report_file_name_keeps_milliseconds() {
    let meta = ReportMeta::new("http://localhost:3000", 1).with_generated_at(
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap() + chrono::Duration::milliseconds(42),
    );

    assert_eq!(
        report_file_name(&meta, ReportFormat::Markdown),
        "report-20260314_092653_042.md"
    );
}

#[test]
fn reports_with_the_same_timestamp_do_not_overwrite_each_other() {
    let fs = MockFileSystem::new();
    let summary = Summary::from_aggregate(&sample_aggregate());
    let meta = sample_meta();
    let dir = Path::new("reports");

    let first = write_report(&fs, dir, ReportFormat::Markdown, &summary, &meta).unwrap();
    let second = write_report(&fs, dir, ReportFormat::Markdown, &summary, &meta).unwrap();
    let third = write_report(&fs, dir, ReportFormat::Markdown, &summary, &meta).unwrap();

    assert_eq!(first, Path::new("reports/report-20260314_092653_000.md"));
    assert_eq!(second, Path::new("reports/report-20260314_092653_000-1.md"));
    assert_eq!(third, Path::new("reports/report-20260314_092653_000-2.md"));
    assert_eq!(fs.files().len(), 3);
}

#[test]
fn write_report_creates_missing_directories() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("nested").join("reports");
    let summary = Summary::from_aggregate(&sample_aggregate());

    let path = write_report(
        &RealFileSystem,
        &target,
        ReportFormat::Markdown,
        &summary,
        &sample_meta(),
    )
    .unwrap();

    assert!(path.starts_with(&target));
    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("# specpilot test report"));
}

#[test]
fn console_summary_lists_failures() {
    let summary = Summary::from_aggregate(&sample_aggregate());

    let text = render_console(&summary);

    assert!(text.starts_with("2 passed, 1 failed, 3 total (66.7%)"));
    assert!(text.contains("FAIL auth/login: Dashboard not visible"));
    assert!(!text.contains("signup"));
}

#[test]
fn durations_are_humanised() {
    assert_eq!(format_duration(Duration::from_millis(850)), "850ms");
    assert_eq!(format_duration(Duration::from_millis(12_340)), "12.3s");
    assert_eq!(format_duration(Duration::from_secs(125)), "2m 05s");
}
