// src/spec/model.rs

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::engine::TaskId;
use crate::types::Priority;

/// Spec file contents exactly as written on disk.
///
/// ```toml
/// goal = "User can log in with valid credentials"
/// start_url = "/login"
/// steps = ["Fill in the email field", "Submit the form"]
/// success_criteria = ["The dashboard is visible"]
///
/// [metadata]
/// tags = ["auth"]
/// priority = "high"
/// dependencies = ["auth/signup"]
/// timeout_secs = 300
/// ```
///
/// `goal` and `start_url` are optional here only so that a missing field is
/// reported as a load error naming the field rather than a generic TOML error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawTestSpec {
    #[serde(default)]
    pub goal: Option<String>,

    #[serde(default)]
    pub start_url: Option<String>,

    #[serde(default)]
    pub steps: Vec<String>,

    #[serde(default)]
    pub success_criteria: Vec<String>,

    #[serde(default)]
    pub metadata: SpecMetadata,
}

/// Optional `[metadata]` table of a spec.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SpecMetadata {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub priority: Priority,

    /// Identifiers of specs this one expects to have run first.
    ///
    /// Informational only: admission order is discovery order and these are
    /// never consulted by the scheduler. See [`crate::spec::deps`].
    #[serde(default)]
    pub dependencies: Vec<TaskId>,

    /// Per-spec executor timeout, overriding `[agent].timeout_secs`.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Validated spec. Constructed through `TryFrom<RawTestSpec>` in
/// [`crate::spec::loader`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestSpec {
    pub goal: String,
    pub start_url: String,
    pub steps: Vec<String>,
    pub success_criteria: Vec<String>,
    pub metadata: SpecMetadata,
}

impl TestSpec {
    /// Display name: `metadata.name` when present, otherwise the goal.
    pub fn display_name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or(&self.goal)
    }
}

/// One schedulable unit of work: a loaded spec plus its identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Unique within a run; derived from the spec's path.
    pub id: TaskId,
    pub spec: TestSpec,
    /// Where the spec was loaded from.
    pub source: PathBuf,
    /// blake3 hex digest of the raw spec file.
    pub fingerprint: String,
}

impl Task {
    pub fn new(id: impl Into<TaskId>, spec: TestSpec) -> Self {
        Self {
            id: id.into(),
            spec,
            source: PathBuf::new(),
            fingerprint: String::new(),
        }
    }
}
