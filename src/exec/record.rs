// src/exec/record.rs

//! The structured result record an agent prints as its last stdout line.
//!
//! ```json
//! {"status": "passed", "steps_completed": ["Opened /login", "Submitted form"]}
//! {"status": "failed", "steps_completed": ["Opened /login"], "error": "No dashboard"}
//! ```
//!
//! Anything else on the final non-empty line is a contract violation and is
//! reported as [`ExecutionError::MalformedOutput`]; earlier lines are free
//! form and never scanned for JSON.

use serde::{Deserialize, Serialize};

use crate::exec::ExecutionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Passed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AgentRecord {
    pub status: RecordStatus,

    #[serde(default)]
    pub steps_completed: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Last non-empty line of `output`, trimmed.
///
/// Works on a whole capture or on one line at a time.
pub fn final_line(output: &str) -> Option<&str> {
    output.lines().map(str::trim).filter(|l| !l.is_empty()).last()
}

/// Parse the record from a single line.
pub fn parse_record(line: &str) -> Result<AgentRecord, ExecutionError> {
    let line = line.trim();
    if !line.starts_with('{') {
        return Err(ExecutionError::MalformedOutput(format!(
            "final line is not a JSON object: {}",
            truncate(line, 200)
        )));
    }
    serde_json::from_str(line).map_err(|e| {
        ExecutionError::MalformedOutput(format!("invalid result record ({e}): {}", truncate(line, 200)))
    })
}

pub(crate) fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let head: String = s.chars().take(max_chars).collect();
    format!("{head}…")
}
