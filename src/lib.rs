// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod exit_codes;
pub mod fs;
pub mod logging;
pub mod report;
pub mod spec;
pub mod types;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use regex::Regex;
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, ConfigOverrides, check_required_env, load_and_validate};
use crate::engine::{
    AggregateResult, ConsoleProgress, LogProgress, ProgressSink, Runtime, RuntimeOptions,
    SchedulerCore,
};
use crate::errors::SpecpilotError;
use crate::exec::{AgentExecutor, AgentExecutorConfig, TaskExecutor, TimeoutExecutor};
use crate::fs::{FileSystem, RealFileSystem};
use crate::report::{ReportMeta, Summary, render_console, write_report};
use crate::spec::{DependencyWarning, SpecRef, Task, discover, filter_refs, lint_dependencies, load_all};

/// How a run that did not fail fatally ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// Specs were executed; the aggregate decides the exit code.
    Completed(AggregateResult),
    /// `--list`: identifiers printed, nothing executed.
    Listed,
    /// `--dry-run`: specs loaded and validated, nothing executed.
    DryRun,
}

/// What an executed run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub aggregate: AggregateResult,
    pub summary: Summary,
    pub report_path: PathBuf,
}

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (file, environment, command line)
/// - spec discovery and eager loading
/// - the agent executor behind the timeout decorator
/// - scheduler runtime with run deadline and Ctrl-C handling
/// - report writing and the console summary
pub async fn run(args: CliArgs) -> Result<RunStatus> {
    let fs = RealFileSystem;
    let env = |key: &str| std::env::var(key).ok();

    let overrides = ConfigOverrides::from_env(env)?.merge(args.overrides());
    let cfg = load_and_validate(&fs, &args.config_source(), &overrides)?;

    let refs = collect_specs(&fs, &cfg, args.filter.as_deref())?;
    if args.list {
        for spec_ref in &refs {
            println!("{}", spec_ref.id);
        }
        return Ok(RunStatus::Listed);
    }

    let tasks = load_all(&fs, &refs)?;
    let warnings = lint_dependencies(&tasks);
    for warning in &warnings {
        warn!("{warning}");
    }

    if args.dry_run {
        print_dry_run(&cfg, &tasks, &warnings);
        return Ok(RunStatus::DryRun);
    }

    check_required_env(&cfg, env)?;

    let executor = build_executor(&cfg);

    // Ctrl-C → abort the run; outcomes so far are still reported.
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {e}");
            return;
        }
        info!("Ctrl+C received, cancelling run");
        let _ = shutdown_tx.send(());
    });

    let report = if cfg.agent.debug {
        execute_run(&fs, &cfg, tasks, executor, LogProgress, Some(shutdown_rx)).await?
    } else {
        execute_run(&fs, &cfg, tasks, executor, ConsoleProgress, Some(shutdown_rx)).await?
    };

    print!("{}", render_console(&report.summary));
    println!("report: {}", report.report_path.display());

    Ok(RunStatus::Completed(report.aggregate))
}

/// Discover specs per the configuration, then apply the optional identifier
/// filter. Finding nothing is a fatal [`SpecpilotError::DiscoveryError`].
pub fn collect_specs(
    fs: &dyn FileSystem,
    cfg: &ConfigFile,
    filter: Option<&str>,
) -> errors::Result<Vec<SpecRef>> {
    let mut refs = discover(fs, &cfg.run.specs_dir, &cfg.run.pattern)?;

    if let Some(raw) = filter {
        let re = Regex::new(raw).map_err(|e| {
            SpecpilotError::ConfigError(format!("invalid --filter regex '{raw}': {e}"))
        })?;
        refs = filter_refs(refs, &re);
    }

    if refs.is_empty() {
        return Err(SpecpilotError::DiscoveryError(format!(
            "no specs found in {:?} matching '{}'{}",
            cfg.run.specs_dir,
            cfg.run.pattern,
            filter.map(|f| format!(" and filter '{f}'")).unwrap_or_default()
        )));
    }

    info!(count = refs.len(), "specs discovered");
    Ok(refs)
}

/// The production executor: one agent process per spec, bounded by the
/// configured default timeout.
pub fn build_executor(cfg: &ConfigFile) -> TimeoutExecutor<AgentExecutor> {
    let agent = AgentExecutor::new(AgentExecutorConfig {
        command: cfg.agent.command.clone(),
        args: cfg.agent.args.clone(),
        base_url: cfg.run.base_url.clone(),
        working_dir: cfg.agent.working_dir.clone(),
        env: cfg
            .agent
            .env
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        debug: cfg.agent.debug,
    });
    TimeoutExecutor::new(agent, cfg.agent.timeout_secs.map(Duration::from_secs))
}

/// Schedule `tasks` through `executor`, then summarise and write the report.
pub async fn execute_run<E, S>(
    fs: &dyn FileSystem,
    cfg: &ConfigFile,
    tasks: Vec<Task>,
    executor: E,
    sink: S,
    shutdown: Option<oneshot::Receiver<()>>,
) -> errors::Result<RunReport>
where
    E: TaskExecutor + 'static,
    S: ProgressSink + 'static,
{
    let meta = ReportMeta::new(cfg.run.base_url.clone(), cfg.run.concurrency).with_tasks(&tasks);

    let core = SchedulerCore::new(tasks, cfg.run.concurrency)?;
    let options = RuntimeOptions {
        deadline: cfg.run.deadline_secs.map(Duration::from_secs),
    };
    let mut runtime = Runtime::new(core, executor, sink).with_options(options);
    if let Some(rx) = shutdown {
        runtime = runtime.with_shutdown(rx);
    }
    let aggregate = runtime.run().await?;

    let summary = Summary::from_aggregate(&aggregate);
    let report_path = write_report(fs, &cfg.report.dir, cfg.report.format, &summary, &meta)?;

    Ok(RunReport {
        aggregate,
        summary,
        report_path,
    })
}

/// Dry-run output: resolved settings, every loaded spec and dependency notes.
fn print_dry_run(cfg: &ConfigFile, tasks: &[Task], warnings: &[DependencyWarning]) {
    println!("specpilot dry-run");
    println!("  run.specs_dir = {}", cfg.run.specs_dir.display());
    println!("  run.concurrency = {}", cfg.run.concurrency);
    println!("  run.base_url = {}", cfg.run.base_url);
    if let Some(secs) = cfg.run.deadline_secs {
        println!("  run.deadline_secs = {secs}");
    }
    println!("  agent.command = {} {}", cfg.agent.command, cfg.agent.args.join(" "));
    if let Some(secs) = cfg.agent.timeout_secs {
        println!("  agent.timeout_secs = {secs}");
    }
    println!();

    println!("specs ({}):", tasks.len());
    for task in tasks {
        let meta = &task.spec.metadata;
        println!("  - {} [{}]", task.id, meta.priority);
        println!("      goal: {}", task.spec.goal);
        println!("      start_url: {}", task.spec.start_url);
        println!("      steps: {}", task.spec.steps.len());
        if !meta.tags.is_empty() {
            println!("      tags: {}", meta.tags.join(", "));
        }
        if !meta.dependencies.is_empty() {
            println!("      dependencies: {}", meta.dependencies.join(", "));
        }
        if let Some(secs) = meta.timeout_secs {
            println!("      timeout_secs: {secs}");
        }
    }

    if !warnings.is_empty() {
        println!();
        println!("dependency notes:");
        for warning in warnings {
            println!("  - {warning}");
        }
    }
}
