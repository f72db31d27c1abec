// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::{ConfigOverrides, ConfigSource};
use crate::types::ReportFormat;

/// Command-line arguments for `specpilot`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "specpilot",
    version,
    about = "Run declarative end-to-end test specs through an AI agent, several at a time.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Specpilot.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory searched for spec files.
    #[arg(long, value_name = "DIR")]
    pub specs_dir: Option<PathBuf>,

    /// Glob (relative to the specs directory) selecting spec files.
    #[arg(long, value_name = "GLOB")]
    pub pattern: Option<String>,

    /// Only run specs whose identifier matches this regex.
    #[arg(long, value_name = "REGEX")]
    pub filter: Option<String>,

    /// Maximum number of specs executing at once.
    #[arg(short = 'c', long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Base URL of the application under test.
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Directory the report is written into.
    #[arg(long, value_name = "DIR")]
    pub report_dir: Option<PathBuf>,

    /// Report format.
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub format: Option<FormatArg>,

    /// Default per-spec timeout in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Deadline for the whole run in seconds.
    #[arg(long, value_name = "SECS")]
    pub deadline: Option<u64>,

    /// Agent executable to invoke for each spec.
    #[arg(long, value_name = "CMD")]
    pub agent_command: Option<String>,

    /// Stream agent output into the log.
    #[arg(long)]
    pub debug: bool,

    /// Print discovered spec identifiers and exit.
    #[arg(long)]
    pub list: bool,

    /// Load and validate every spec, print them, but execute nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SPECPILOT_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

impl CliArgs {
    pub fn config_source(&self) -> ConfigSource {
        match &self.config {
            Some(path) => ConfigSource::Explicit(path.clone()),
            None => ConfigSource::Default,
        }
    }

    /// Config values given on the command line.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            specs_dir: self.specs_dir.clone(),
            pattern: self.pattern.clone(),
            concurrency: self.concurrency,
            deadline_secs: self.deadline,
            base_url: self.base_url.clone(),
            agent_command: self.agent_command.clone(),
            timeout_secs: self.timeout,
            debug: self.debug,
            report_dir: self.report_dir.clone(),
            report_format: self.format.map(ReportFormat::from),
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Report format as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Markdown,
    Json,
}

impl From<FormatArg> for ReportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Markdown => ReportFormat::Markdown,
            FormatArg::Json => ReportFormat::Json,
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
