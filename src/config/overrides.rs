// src/config/overrides.rs

//! Environment and command-line overrides layered on top of the file.

use std::path::PathBuf;

use crate::config::model::RawConfigFile;
use crate::errors::{Result, SpecpilotError};
use crate::types::ReportFormat;

/// A sparse set of values that replace what the file (or defaults) said.
///
/// `None` / `false` leave the underlying value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub specs_dir: Option<PathBuf>,
    pub pattern: Option<String>,
    pub concurrency: Option<usize>,
    pub deadline_secs: Option<u64>,
    pub base_url: Option<String>,
    pub agent_command: Option<String>,
    pub timeout_secs: Option<u64>,
    pub debug: bool,
    pub report_dir: Option<PathBuf>,
    pub report_format: Option<ReportFormat>,
}

impl ConfigOverrides {
    /// Read the `SPECPILOT_*` variables through `lookup`.
    ///
    /// Recognised: `SPECPILOT_CONCURRENCY`, `SPECPILOT_BASE_URL`,
    /// `SPECPILOT_SPECS_DIR`, `SPECPILOT_REPORT_DIR`,
    /// `SPECPILOT_REPORT_FORMAT`, `SPECPILOT_AGENT_COMMAND` and
    /// `SPECPILOT_DEBUG`.
    pub fn from_env<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let concurrency = match get("SPECPILOT_CONCURRENCY") {
            Some(raw) => Some(raw.trim().parse::<usize>().map_err(|_| {
                SpecpilotError::ConfigError(format!(
                    "SPECPILOT_CONCURRENCY must be a positive integer (got '{raw}')"
                ))
            })?),
            None => None,
        };

        let report_format = match get("SPECPILOT_REPORT_FORMAT") {
            Some(raw) => Some(
                raw.parse::<ReportFormat>()
                    .map_err(|e| SpecpilotError::ConfigError(format!("SPECPILOT_REPORT_FORMAT: {e}")))?,
            ),
            None => None,
        };

        let debug = get("SPECPILOT_DEBUG")
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);

        Ok(Self {
            specs_dir: get("SPECPILOT_SPECS_DIR").map(PathBuf::from),
            concurrency,
            base_url: get("SPECPILOT_BASE_URL"),
            agent_command: get("SPECPILOT_AGENT_COMMAND"),
            debug,
            report_dir: get("SPECPILOT_REPORT_DIR").map(PathBuf::from),
            report_format,
            ..Self::default()
        })
    }

    /// Layer `higher` on top of `self`; values set in `higher` win.
    pub fn merge(self, higher: ConfigOverrides) -> ConfigOverrides {
        ConfigOverrides {
            specs_dir: higher.specs_dir.or(self.specs_dir),
            pattern: higher.pattern.or(self.pattern),
            concurrency: higher.concurrency.or(self.concurrency),
            deadline_secs: higher.deadline_secs.or(self.deadline_secs),
            base_url: higher.base_url.or(self.base_url),
            agent_command: higher.agent_command.or(self.agent_command),
            timeout_secs: higher.timeout_secs.or(self.timeout_secs),
            debug: higher.debug || self.debug,
            report_dir: higher.report_dir.or(self.report_dir),
            report_format: higher.report_format.or(self.report_format),
        }
    }

    pub(crate) fn apply(&self, raw: &mut RawConfigFile) {
        if let Some(dir) = &self.specs_dir {
            raw.run.specs_dir = dir.clone();
        }
        if let Some(pattern) = &self.pattern {
            raw.run.pattern = pattern.clone();
        }
        if let Some(n) = self.concurrency {
            raw.run.concurrency = n;
        }
        if let Some(secs) = self.deadline_secs {
            raw.run.deadline_secs = Some(secs);
        }
        if let Some(url) = &self.base_url {
            raw.run.base_url = url.clone();
        }
        if let Some(cmd) = &self.agent_command {
            raw.agent.command = cmd.clone();
        }
        if let Some(secs) = self.timeout_secs {
            raw.agent.timeout_secs = Some(secs);
        }
        if self.debug {
            raw.agent.debug = true;
        }
        if let Some(dir) = &self.report_dir {
            raw.report.dir = dir.clone();
        }
        if let Some(format) = self.report_format {
            raw.report.format = format;
        }
    }
}
