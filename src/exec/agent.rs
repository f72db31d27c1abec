// src/exec/agent.rs

//! Executor that hands each spec to an external agent process.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info, trace};

use crate::engine::{Outcome, TaskId};
use crate::exec::prompt::build_prompt;
use crate::exec::record::{AgentRecord, RecordStatus, final_line, parse_record, truncate};
use crate::exec::{ExecuteFuture, ExecutionError, TaskExecutor};
use crate::spec::Task;

/// How many trailing stderr lines are kept for error messages.
const STDERR_TAIL_LINES: usize = 20;

/// Settings for [`AgentExecutor`], fixed at construction.
#[derive(Debug, Clone)]
pub struct AgentExecutorConfig {
    /// Agent executable; looked up on `PATH` when not a path.
    pub command: String,
    /// Arguments placed before the prompt, which is always the last argument.
    pub args: Vec<String>,
    /// Base URL that relative `start_url`s are resolved against.
    pub base_url: String,
    pub working_dir: Option<PathBuf>,
    /// Extra environment variables for the agent process.
    pub env: Vec<(String, String)>,
    /// Stream every agent output line at INFO instead of TRACE.
    pub debug: bool,
}

impl Default for AgentExecutorConfig {
    fn default() -> Self {
        Self {
            command: "claude".to_string(),
            args: vec!["--print".to_string()],
            base_url: "http://localhost:3000".to_string(),
            working_dir: None,
            env: Vec::new(),
            debug: false,
        }
    }
}

/// Runs one spec per agent process.
///
/// The prompt is built from the spec; the process must print a JSON result
/// record as its final stdout line (see [`crate::exec::record`]).
#[derive(Debug, Clone)]
pub struct AgentExecutor {
    config: AgentExecutorConfig,
}

impl AgentExecutor {
    pub fn new(config: AgentExecutorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AgentExecutorConfig {
        &self.config
    }

    async fn run_agent(&self, task: &Task) -> Result<Outcome, ExecutionError> {
        let started = Instant::now();
        let prompt = build_prompt(&task.spec, &self.config.base_url);

        info!(
            task = %task.id,
            command = %self.config.command,
            prompt_len = prompt.len(),
            "starting agent process"
        );

        let mut cmd = Command::new(&self.config.command);
        cmd.args(&self.config.args)
            .arg(&prompt)
            .env("SPECPILOT_TASK_ID", &task.id)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (key, value) in &self.config.env {
            cmd.env(key, value);
        }
        if let Some(dir) = &self.config.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|source| ExecutionError::Spawn {
            command: self.config.command.clone(),
            source,
        })?;

        let stderr_tail = child
            .stderr
            .take()
            .map(|stderr| tokio::spawn(collect_stderr(task.id.clone(), stderr, self.config.debug)));

        let mut last_line: Option<String> = None;
        if let Some(stdout) = child.stdout.take() {
            let mut reader = BufReader::new(stdout);
            let mut buf = Vec::new();
            while let Some(line) = next_lossy_line(&mut reader, &mut buf).await? {
                if self.config.debug {
                    info!(task = %task.id, "agent: {}", line);
                } else {
                    trace!(task = %task.id, "agent: {}", line);
                }
                if let Some(line) = final_line(&line) {
                    last_line = Some(line.to_string());
                }
            }
        }

        let status = child.wait().await?;
        let duration = started.elapsed();
        let stderr_tail = match stderr_tail {
            Some(handle) => handle.await.unwrap_or_default(),
            None => String::new(),
        };

        info!(
            task = %task.id,
            exit_code = ?status.code(),
            success = status.success(),
            duration_ms = duration.as_millis() as u64,
            "agent process exited"
        );

        let record = match last_line.as_deref() {
            Some(line) => parse_record(line),
            None => Err(ExecutionError::MalformedOutput(
                "agent produced no output".to_string(),
            )),
        };

        match record {
            Ok(record) => Ok(outcome_from_record(&task.id, record, duration)),
            Err(err) if !status.success() => {
                debug!(task = %task.id, error = %err, "no valid record from failed agent");
                Err(ExecutionError::ProcessFailed {
                    code: status.code(),
                    stderr_tail,
                })
            }
            Err(err) => Err(err),
        }
    }
}

impl TaskExecutor for AgentExecutor {
    fn execute(&self, task: Task) -> ExecuteFuture<'_> {
        Box::pin(async move { self.run_agent(&task).await })
    }
}

/// Map a parsed record to the task's outcome.
pub fn outcome_from_record(id: &TaskId, record: AgentRecord, duration: Duration) -> Outcome {
    let outcome = match record.status {
        RecordStatus::Passed => Outcome::passed(id.clone(), duration),
        RecordStatus::Failed => Outcome::failed(
            id.clone(),
            duration,
            record
                .error
                .unwrap_or_else(|| "agent reported failure without a reason".to_string()),
        ),
    };
    outcome.with_steps(record.steps_completed)
}

/// Drain stderr so the pipe never fills, keeping the last few lines.
async fn collect_stderr<R>(task: TaskId, stderr: R, debug: bool) -> String
where
    R: AsyncRead + Unpin,
{
    let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);
    let mut reader = BufReader::new(stderr);
    let mut buf = Vec::new();

    while let Ok(Some(line)) = next_lossy_line(&mut reader, &mut buf).await {
        if debug {
            info!(task = %task, "agent stderr: {}", line);
        } else {
            debug!(task = %task, "agent stderr: {}", line);
        }
        if tail.len() == STDERR_TAIL_LINES {
            tail.pop_front();
        }
        tail.push_back(line);
    }

    let joined = tail.into_iter().collect::<Vec<_>>().join("\n");
    truncate(&joined, 2000)
}

/// Next `\n`-terminated line, decoded lossily. Agent output is free form and
/// may contain bytes that are not UTF-8; only the final record line is
/// parsed strictly.
async fn next_lossy_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(&buf[..]);
    Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
}
