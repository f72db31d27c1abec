// src/exec/prompt.rs

use std::fmt::Write as _;

use crate::spec::TestSpec;

/// Resolve a spec's `start_url` against `base_url`.
///
/// Absolute `http(s)://` URLs are returned unchanged; anything else is
/// treated as a path below the base URL.
pub fn resolve_start_url(base_url: &str, start_url: &str) -> String {
    if start_url.starts_with("http://") || start_url.starts_with("https://") {
        return start_url.to_string();
    }
    let base = base_url.trim_end_matches('/');
    let path = start_url.trim_start_matches('/');
    if path.is_empty() {
        format!("{base}/")
    } else {
        format!("{base}/{path}")
    }
}

/// Build the task description handed to the agent for one spec.
pub fn build_prompt(spec: &TestSpec, base_url: &str) -> String {
    let mut out = String::new();
    let url = resolve_start_url(base_url, &spec.start_url);

    let _ = writeln!(out, "You are executing an end-to-end test of a web application.");
    let _ = writeln!(out);
    let _ = writeln!(out, "Test: {}", spec.display_name());
    let _ = writeln!(out, "Goal: {}", spec.goal);
    let _ = writeln!(out, "Start URL: {url}");

    if let Some(desc) = &spec.metadata.description {
        let _ = writeln!(out, "Context: {desc}");
    }

    if !spec.steps.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Steps:");
        for (i, step) in spec.steps.iter().enumerate() {
            let _ = writeln!(out, "{}. {}", i + 1, step);
        }
    }

    if !spec.success_criteria.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "The test passes only if all of the following hold:");
        for criterion in &spec.success_criteria {
            let _ = writeln!(out, "- {criterion}");
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "When you are done, print exactly one line of JSON as the very last line of your output, with no text after it:"
    );
    let _ = writeln!(
        out,
        r#"{{"status": "passed" | "failed", "steps_completed": ["<step>", ...], "error": "<reason, only when failed>"}}"#
    );

    out
}
