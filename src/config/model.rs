// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::spec::DEFAULT_SPEC_PATTERN;
use crate::types::ReportFormat;

/// Default number of specs executing at once.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Top-level configuration as read from `Specpilot.toml`.
///
/// ```toml
/// [run]
/// specs_dir = "specs"
/// concurrency = 5
/// base_url = "http://localhost:3000"
///
/// [agent]
/// command = "claude"
/// args = ["--print"]
/// timeout_secs = 600
/// required_env = "ANTHROPIC_API_KEY"
///
/// [report]
/// dir = "reports"
/// format = "markdown"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub run: RunSection,

    #[serde(default)]
    pub agent: AgentSection,

    #[serde(default)]
    pub report: ReportSection,
}

/// Validated configuration. Only constructed through
/// `ConfigFile::try_from(RawConfigFile)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub run: RunSection,
    pub agent: AgentSection,
    pub report: ReportSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(run: RunSection, agent: AgentSection, report: ReportSection) -> Self {
        Self { run, agent, report }
    }
}

/// `[run]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunSection {
    /// Directory searched for spec files.
    #[serde(default = "default_specs_dir")]
    pub specs_dir: PathBuf,

    /// Glob, relative to `specs_dir`, selecting spec files.
    #[serde(default = "default_pattern")]
    pub pattern: String,

    /// Maximum number of specs executing at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Optional whole-run deadline in seconds.
    #[serde(default)]
    pub deadline_secs: Option<u64>,

    /// Base URL of the application under test.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_specs_dir() -> PathBuf {
    PathBuf::from("specs")
}

fn default_pattern() -> String {
    DEFAULT_SPEC_PATTERN.to_string()
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            specs_dir: default_specs_dir(),
            pattern: default_pattern(),
            concurrency: default_concurrency(),
            deadline_secs: None,
            base_url: default_base_url(),
        }
    }
}

/// `[agent]` section: how the external agent process is started.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentSection {
    #[serde(default = "default_agent_command")]
    pub command: String,

    /// Arguments placed before the prompt.
    #[serde(default = "default_agent_args")]
    pub args: Vec<String>,

    /// Default per-spec timeout; specs may override it.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    /// Extra environment for the agent process.
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Environment variable that must be set before anything runs, e.g.
    /// the agent's API key.
    #[serde(default)]
    pub required_env: Option<String>,

    /// Stream agent output into the log at INFO.
    #[serde(default)]
    pub debug: bool,
}

fn default_agent_command() -> String {
    "claude".to_string()
}

fn default_agent_args() -> Vec<String> {
    vec!["--print".to_string()]
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            command: default_agent_command(),
            args: default_agent_args(),
            timeout_secs: None,
            working_dir: None,
            env: BTreeMap::new(),
            required_env: None,
            debug: false,
        }
    }
}

/// `[report]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportSection {
    #[serde(default = "default_report_dir")]
    pub dir: PathBuf,

    #[serde(default)]
    pub format: ReportFormat,
}

fn default_report_dir() -> PathBuf {
    PathBuf::from("reports")
}

impl Default for ReportSection {
    fn default() -> Self {
        Self {
            dir: default_report_dir(),
            format: ReportFormat::default(),
        }
    }
}
