// src/spec/loader.rs

use tracing::{debug, info};

use crate::errors::{Result, SpecpilotError};
use crate::fs::FileSystem;
use crate::spec::discover::SpecRef;
use crate::spec::model::{RawTestSpec, Task, TestSpec};

impl TryFrom<RawTestSpec> for TestSpec {
    type Error = String;

    fn try_from(raw: RawTestSpec) -> std::result::Result<Self, Self::Error> {
        let goal = required_field(raw.goal, "goal")?;
        let start_url = required_field(raw.start_url, "start_url")?;

        if raw.steps.iter().any(|s| s.trim().is_empty()) {
            return Err("`steps` must not contain empty entries".to_string());
        }
        if let Some(0) = raw.metadata.timeout_secs {
            return Err("`metadata.timeout_secs` must be >= 1 (got 0)".to_string());
        }

        Ok(TestSpec {
            goal,
            start_url,
            steps: raw.steps,
            success_criteria: raw.success_criteria,
            metadata: raw.metadata,
        })
    }
}

fn required_field(value: Option<String>, field: &str) -> std::result::Result<String, String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        Some(_) => Err(format!("required field `{field}` is empty")),
        None => Err(format!("missing required field `{field}`")),
    }
}

/// Parse and validate spec content. `id` is only used for error messages.
pub fn parse_spec(id: &str, contents: &str) -> Result<TestSpec> {
    let raw: RawTestSpec =
        toml::from_str(contents).map_err(|e| SpecpilotError::task_load(id, e.to_string()))?;
    TestSpec::try_from(raw).map_err(|msg| SpecpilotError::task_load(id, msg))
}

/// Read, fingerprint and validate a single discovered spec.
pub fn load(fs: &dyn FileSystem, spec_ref: &SpecRef) -> Result<Task> {
    let bytes = fs
        .read(&spec_ref.path)
        .map_err(|e| SpecpilotError::task_load(&spec_ref.id, format!("{e:#}")))?;
    let contents = String::from_utf8(bytes)
        .map_err(|_| SpecpilotError::task_load(&spec_ref.id, "spec file is not valid UTF-8"))?;

    let spec = parse_spec(&spec_ref.id, &contents)?;
    let fingerprint = blake3::hash(contents.as_bytes()).to_hex().to_string();

    debug!(task = %spec_ref.id, path = ?spec_ref.path, %fingerprint, "spec loaded");

    Ok(Task {
        id: spec_ref.id.clone(),
        spec,
        source: spec_ref.path.clone(),
        fingerprint,
    })
}

/// Load every discovered spec, in order. The first failure aborts loading.
pub fn load_all(fs: &dyn FileSystem, refs: &[SpecRef]) -> Result<Vec<Task>> {
    let tasks = refs
        .iter()
        .map(|r| load(fs, r))
        .collect::<Result<Vec<_>>>()?;
    info!(count = tasks.len(), "specs loaded");
    Ok(tasks)
}
