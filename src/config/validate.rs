// src/config/validate.rs

use globset::Glob;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, SpecpilotError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = SpecpilotError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.run, raw.agent, raw.report))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_run_section(cfg)?;
    validate_agent_section(cfg)?;
    Ok(())
}

fn validate_run_section(cfg: &RawConfigFile) -> Result<()> {
    if cfg.run.concurrency == 0 {
        return Err(SpecpilotError::ConfigError(
            "[run].concurrency must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.run.deadline_secs == Some(0) {
        return Err(SpecpilotError::ConfigError(
            "[run].deadline_secs must be >= 1 (got 0)".to_string(),
        ));
    }

    let url = cfg.run.base_url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(SpecpilotError::ConfigError(format!(
            "[run].base_url must start with http:// or https:// (got '{url}')"
        )));
    }

    Glob::new(&cfg.run.pattern).map_err(|e| {
        SpecpilotError::ConfigError(format!(
            "[run].pattern '{}' is not a valid glob: {e}",
            cfg.run.pattern
        ))
    })?;

    Ok(())
}

fn validate_agent_section(cfg: &RawConfigFile) -> Result<()> {
    if cfg.agent.command.trim().is_empty() {
        return Err(SpecpilotError::ConfigError(
            "[agent].command must not be empty".to_string(),
        ));
    }

    if cfg.agent.timeout_secs == Some(0) {
        return Err(SpecpilotError::ConfigError(
            "[agent].timeout_secs must be >= 1 (got 0)".to_string(),
        ));
    }

    if let Some(var) = &cfg.agent.required_env {
        if var.trim().is_empty() {
            return Err(SpecpilotError::ConfigError(
                "[agent].required_env must not be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}

/// Fail unless the credential variable named by `[agent].required_env` is
/// set and non-empty according to `lookup`.
pub fn check_required_env<F>(cfg: &ConfigFile, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(var) = &cfg.agent.required_env else {
        return Ok(());
    };
    match lookup(var) {
        Some(value) if !value.trim().is_empty() => Ok(()),
        _ => Err(SpecpilotError::ConfigError(format!(
            "required environment variable {var} is not set"
        ))),
    }
}
