// tests/agent_executor.rs

mod common;
use crate::common::{init_tracing, with_timeout};

use std::time::Duration;

use specpilot::engine::OutcomeStatus;
use specpilot::exec::agent::outcome_from_record;
use specpilot::exec::prompt::{build_prompt, resolve_start_url};
use specpilot::exec::record::{RecordStatus, final_line, parse_record};
use specpilot::exec::{AgentExecutor, AgentExecutorConfig, ExecutionError, TaskExecutor};
use specpilot_test_utils::builders::TestSpecBuilder;

#[test]
fn final_line_skips_trailing_blank_lines() {
    let out = "thinking...\n{\"status\": \"passed\"}\n\n   \n";
    assert_eq!(final_line(out), Some("{\"status\": \"passed\"}"));
    assert_eq!(final_line("\n \n"), None);
}

#[test]
fn parse_record_accepts_passed_and_failed() {
    let rec = parse_record(r#"{"status": "passed", "steps_completed": ["open", "click"]}"#).unwrap();
    assert_eq!(rec.status, RecordStatus::Passed);
    assert_eq!(rec.steps_completed, vec!["open", "click"]);
    assert_eq!(rec.error, None);

    let rec = parse_record(r#"{"status": "failed", "error": "no dashboard"}"#).unwrap();
    assert_eq!(rec.status, RecordStatus::Failed);
    assert!(rec.steps_completed.is_empty());
    assert_eq!(rec.error.as_deref(), Some("no dashboard"));
}

#[test]
fn parse_record_rejects_contract_violations() {
    for line in [
        "All tests passed!",
        r#"{"status": "maybe"}"#,
        r#"{"steps_completed": []}"#,
        r#"{"status": "passed""#,
        r#"["passed"]"#,
    ] {
        match parse_record(line) {
            Err(ExecutionError::MalformedOutput(_)) => {}
            other => panic!("expected MalformedOutput for {line:?}, got {other:?}"),
        }
    }
}

#[test]
fn failed_record_without_reason_gets_a_default_message() {
    let rec = parse_record(r#"{"status": "failed"}"#).unwrap();
    let outcome = outcome_from_record(&"t".to_string(), rec, Duration::from_secs(2));

    assert_eq!(outcome.status, OutcomeStatus::Failed);
    assert_eq!(outcome.duration, Duration::from_secs(2));
    assert_eq!(
        outcome.error.as_deref(),
        Some("agent reported failure without a reason")
    );
    assert_eq!(outcome.steps_completed, Some(vec![]));
}

#[test]
fn start_url_resolution() {
    assert_eq!(
        resolve_start_url("http://localhost:3000", "/login"),
        "http://localhost:3000/login"
    );
    assert_eq!(
        resolve_start_url("http://localhost:3000/", "login"),
        "http://localhost:3000/login"
    );
    assert_eq!(resolve_start_url("http://localhost:3000", "/"), "http://localhost:3000/");
    assert_eq!(
        resolve_start_url("http://localhost:3000", "https://example.com/x"),
        "https://example.com/x"
    );
}

#[test]
fn prompt_contains_everything_the_agent_needs() {
    let spec = TestSpecBuilder::new("User can log in")
        .start_url("/login")
        .step("Fill in the email")
        .step("Submit the form")
        .criterion("Dashboard is visible")
        .name("Login")
        .build();

    let prompt = build_prompt(&spec, "http://app.test");

    assert!(prompt.contains("Test: Login"));
    assert!(prompt.contains("Goal: User can log in"));
    assert!(prompt.contains("Start URL: http://app.test/login"));
    assert!(prompt.contains("1. Fill in the email"));
    assert!(prompt.contains("2. Submit the form"));
    assert!(prompt.contains("- Dashboard is visible"));
    assert!(prompt.contains(r#""status""#));
}

#[cfg(unix)]
mod process {
    use super::*;

    fn shell_agent(script: &str) -> AgentExecutor {
        AgentExecutor::new(AgentExecutorConfig {
            command: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            ..AgentExecutorConfig::default()
        })
    }

    fn task() -> specpilot::spec::Task {
        TestSpecBuilder::new("shell agent").task("shell")
    }

    #[tokio::test]
    async fn passed_record_on_last_line() {
        init_tracing();
        let agent = shell_agent(
            r#"echo "working on $SPECPILOT_TASK_ID"; echo '{"status":"passed","steps_completed":["a","b"]}'"#,
        );

        let outcome = with_timeout(agent.execute(task())).await.unwrap();

        assert_eq!(outcome.id, "shell");
        assert!(outcome.is_passed());
        assert_eq!(
            outcome.steps_completed,
            Some(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[tokio::test]
    async fn failed_record_is_a_failed_outcome_even_with_nonzero_exit() {
        let agent = shell_agent(r#"echo '{"status":"failed","error":"button missing"}'; exit 3"#);

        let outcome = with_timeout(agent.execute(task())).await.unwrap();

        assert_eq!(outcome.status, OutcomeStatus::Failed);
        assert_eq!(outcome.error.as_deref(), Some("button missing"));
    }

    #[tokio::test]
    async fn prose_on_last_line_is_malformed_output() {
        let agent = shell_agent(r#"echo '{"status":"passed"}'; echo "done!""#);

        let err = with_timeout(agent.execute(task())).await.unwrap_err();

        assert!(matches!(err, ExecutionError::MalformedOutput(_)), "{err:?}");
    }

    #[tokio::test]
    async fn non_utf8_chatter_before_the_record_is_tolerated() {
        let agent = shell_agent(
            r#"printf 'log \377\376 binary\n'; printf 'warn \377\n' >&2; printf '{"status": "passed"}\r\n'"#,
        );

        let outcome = with_timeout(agent.execute(task())).await.unwrap();

        assert!(outcome.is_passed());
    }

    #[tokio::test]
    async fn non_utf8_final_line_is_malformed_output() {
        let agent = shell_agent(r#"printf '{"status": "passed"}\n\377\n'"#);

        let err = with_timeout(agent.execute(task())).await.unwrap_err();

        assert!(matches!(err, ExecutionError::MalformedOutput(_)), "{err:?}");
    }

    #[tokio::test]
    async fn no_output_is_malformed_output() {
        let agent = shell_agent("true");

        let err = with_timeout(agent.execute(task())).await.unwrap_err();

        match err {
            ExecutionError::MalformedOutput(msg) => assert!(msg.contains("no output")),
            other => panic!("expected MalformedOutput, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn nonzero_exit_without_record_reports_exit_code_and_stderr() {
        let agent = shell_agent(r#"echo "auth failed" >&2; exit 7"#);

        let err = with_timeout(agent.execute(task())).await.unwrap_err();

        match err {
            ExecutionError::ProcessFailed { code, stderr_tail } => {
                assert_eq!(code, Some(7));
                assert!(stderr_tail.contains("auth failed"));
            }
            other => panic!("expected ProcessFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_binary_is_a_spawn_error() {
        let agent = AgentExecutor::new(AgentExecutorConfig {
            command: "specpilot-no-such-agent-binary".to_string(),
            args: vec![],
            ..AgentExecutorConfig::default()
        });

        let err = with_timeout(agent.execute(task())).await.unwrap_err();

        assert!(matches!(err, ExecutionError::Spawn { .. }), "{err:?}");
        assert!(err.to_string().contains("specpilot-no-such-agent-binary"));
    }

    #[tokio::test]
    async fn configured_env_reaches_the_agent() {
        let agent = AgentExecutor::new(AgentExecutorConfig {
            command: "sh".to_string(),
            args: vec![
                "-c".to_string(),
                r#"if [ "$APP_USER" = "tester" ]; then echo '{"status":"passed"}'; else echo '{"status":"failed","error":"no env"}'; fi"#
                    .to_string(),
            ],
            env: vec![("APP_USER".to_string(), "tester".to_string())],
            ..AgentExecutorConfig::default()
        });

        let outcome = with_timeout(agent.execute(task())).await.unwrap();
        assert!(outcome.is_passed(), "{outcome:?}");
    }
}
