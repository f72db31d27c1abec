// tests/runtime_failures.rs

mod common;
use crate::common::{assert_snapshot_invariants, init_tracing, recording_sink, with_timeout};

use std::error::Error;
use std::time::Duration;

use tokio::sync::oneshot;

use specpilot::engine::{
    OutcomeStatus, Runtime, RuntimeOptions, SchedulerCore, run_tasks,
};
use specpilot::exec::TimeoutExecutor;
use specpilot_test_utils::builders::{TestSpecBuilder, tasks};
use specpilot_test_utils::fake_executor::{Behaviour, FakeExecutor};

type TestResult = Result<(), Box<dyn Error>>;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[tokio::test]
async fn panicking_execution_becomes_a_failed_outcome() -> TestResult {
    init_tracing();

    let executor = FakeExecutor::new()
        .with("a", Behaviour::Pass(ms(5)))
        .with("b", Behaviour::Panic);
    let (sink, _seen) = recording_sink();

    let agg = with_timeout(run_tasks(tasks(&["a", "b", "c"]), 2, executor, sink)).await?;

    assert_eq!(agg.total, 3);
    assert_eq!(agg.passed_count, 2);
    let b = agg.results.iter().find(|o| o.id == "b").unwrap();
    assert_eq!(b.status, OutcomeStatus::Failed);
    assert_eq!(b.duration, Duration::ZERO);
    let msg = b.error.as_deref().unwrap_or_default();
    assert!(msg.contains("panicked"), "unexpected error: {msg}");
    Ok(())
}

#[tokio::test]
async fn panic_before_the_future_exists_is_isolated_too() -> TestResult {
    init_tracing();

    let executor = FakeExecutor::new().with("boom", Behaviour::PanicOnCall);
    let (sink, _seen) = recording_sink();

    let agg = with_timeout(run_tasks(
        tasks(&["first", "boom", "last"]),
        1,
        executor.clone(),
        sink,
    ))
    .await?;

    assert_eq!(agg.total, 3);
    assert_eq!(agg.failed_count, 1);
    assert_eq!(executor.started(), vec!["first", "last"]);
    let boom = agg.results.iter().find(|o| o.id == "boom").unwrap();
    assert!(boom.error.as_deref().unwrap_or_default().contains("while starting boom"));
    Ok(())
}

#[tokio::test]
async fn deadline_aborts_in_flight_and_fails_queued_tasks() -> TestResult {
    init_tracing();

    let executor = FakeExecutor::new()
        .with("quick", Behaviour::Pass(ms(5)))
        .with("stuck", Behaviour::Hang);
    let (sink, seen) = recording_sink();

    let core = SchedulerCore::new(tasks(&["quick", "stuck", "never"]), 2)?;
    let runtime = Runtime::new(core, executor.clone(), sink).with_options(RuntimeOptions {
        deadline: Some(ms(150)),
    });

    let agg = with_timeout(runtime.run()).await?;

    assert_eq!(agg.total, 3);
    assert_eq!(agg.passed_count, 1);
    assert_eq!(agg.failed_count, 2);

    let stuck = agg.results.iter().find(|o| o.id == "stuck").unwrap();
    assert_eq!(stuck.error.as_deref(), Some("run deadline exceeded"));
    assert!(stuck.duration >= ms(100));

    let never = agg.results.iter().find(|o| o.id == "never").unwrap();
    assert_eq!(never.error.as_deref(), Some("not started: run deadline exceeded"));

    // The hung execution was dropped, not left running.
    tokio::time::sleep(ms(20)).await;
    assert_eq!(executor.current_concurrency(), 0);
    assert!(!executor.finished().contains(&"stuck".to_string()));

    assert_snapshot_invariants(&seen.lock().unwrap(), 3, 2);
    Ok(())
}

#[tokio::test]
async fn unrepresentable_deadline_is_treated_as_none() -> TestResult {
    init_tracing();

    let (sink, _seen) = recording_sink();
    let core = SchedulerCore::new(tasks(&["a", "b"]), 2)?;
    let runtime = Runtime::new(core, FakeExecutor::new(), sink).with_options(RuntimeOptions {
        deadline: Some(Duration::from_secs(u64::MAX)),
    });

    let agg = with_timeout(runtime.run()).await?;

    assert_eq!(agg.total, 2);
    assert_eq!(agg.passed_count, 2);
    Ok(())
}

#[tokio::test]
async fn completions_are_recorded_while_deadline_and_shutdown_are_armed() -> TestResult {
    init_tracing();

    let executor = FakeExecutor::new()
        .with("a", Behaviour::Pass(ms(5)))
        .with("b", Behaviour::Pass(ms(10)))
        .with("c", Behaviour::Pass(ms(5)))
        .with("d", Behaviour::Pass(ms(15)));
    let (sink, seen) = recording_sink();
    let (_shutdown_tx, shutdown_rx) = oneshot::channel();

    let core = SchedulerCore::new(tasks(&["a", "b", "c", "d"]), 2)?;
    let runtime = Runtime::new(core, executor, sink)
        .with_options(RuntimeOptions {
            deadline: Some(Duration::from_secs(30)),
        })
        .with_shutdown(shutdown_rx);

    let agg = with_timeout(runtime.run()).await?;

    assert_eq!(agg.passed_count, 4);
    assert!(agg.results.iter().all(|o| o.error.is_none()));
    assert_snapshot_invariants(&seen.lock().unwrap(), 4, 2);
    Ok(())
}

#[tokio::test]
async fn shutdown_request_cancels_the_run() -> TestResult {
    init_tracing();

    let executor = FakeExecutor::new()
        .with("a", Behaviour::Hang)
        .with("b", Behaviour::Hang);
    let (sink, _seen) = recording_sink();
    let (tx, rx) = oneshot::channel();

    let core = SchedulerCore::new(tasks(&["a", "b", "c"]), 2)?;
    let runtime = Runtime::new(core, executor.clone(), sink).with_shutdown(rx);

    tokio::spawn(async move {
        tokio::time::sleep(ms(50)).await;
        let _ = tx.send(());
    });

    let agg = with_timeout(runtime.run()).await?;

    assert_eq!(agg.total, 3);
    assert_eq!(agg.failed_count, 3);
    let errors: Vec<_> = agg
        .results
        .iter()
        .map(|o| (o.id.as_str(), o.error.as_deref().unwrap_or_default()))
        .collect();
    assert!(errors.contains(&("a", "run cancelled")));
    assert!(errors.contains(&("b", "run cancelled")));
    assert!(errors.contains(&("c", "not started: run cancelled")));

    tokio::time::sleep(ms(20)).await;
    assert_eq!(executor.current_concurrency(), 0);
    Ok(())
}

#[tokio::test]
async fn dropped_shutdown_sender_does_not_end_the_run() -> TestResult {
    let executor = FakeExecutor::new().with("a", Behaviour::Pass(ms(30)));
    let (sink, _seen) = recording_sink();
    let (tx, rx) = oneshot::channel::<()>();
    drop(tx);

    let core = SchedulerCore::new(tasks(&["a", "b"]), 1)?;
    let agg = with_timeout(Runtime::new(core, executor, sink).with_shutdown(rx).run()).await?;

    assert_eq!(agg.passed_count, 2);
    Ok(())
}

#[tokio::test]
async fn timeout_executor_fails_slow_tasks_without_stalling_others() -> TestResult {
    init_tracing();

    let inner = FakeExecutor::new()
        .with("slow", Behaviour::Hang)
        .with("fast", Behaviour::Pass(ms(5)));
    let executor = TimeoutExecutor::new(inner.clone(), Some(ms(80)));
    let (sink, _seen) = recording_sink();

    let agg = with_timeout(run_tasks(tasks(&["slow", "fast"]), 2, executor, sink)).await?;

    assert_eq!(agg.passed_count, 1);
    let slow = agg.results.iter().find(|o| o.id == "slow").unwrap();
    assert_eq!(slow.error.as_deref(), Some("timed out after 80ms"));
    assert!(slow.duration >= ms(80));
    assert_eq!(inner.current_concurrency(), 0);
    Ok(())
}

#[tokio::test]
async fn spec_timeout_overrides_the_default() -> TestResult {
    let inner = FakeExecutor::new().with("a", Behaviour::Pass(ms(1500)));
    let executor = TimeoutExecutor::new(inner, Some(Duration::from_secs(60)));

    let task = TestSpecBuilder::new("slow page").timeout_secs(1).task("a");
    assert_eq!(executor.timeout_for(&task), Some(Duration::from_secs(1)));

    let (sink, _seen) = recording_sink();
    let agg = with_timeout(run_tasks(vec![task], 1, executor, sink)).await?;

    assert_eq!(agg.results[0].error.as_deref(), Some("timed out after 1s"));
    Ok(())
}

#[tokio::test]
async fn no_timeout_configured_means_unbounded() -> TestResult {
    let inner = FakeExecutor::new().with("a", Behaviour::Pass(ms(20)));
    let executor = TimeoutExecutor::new(inner, None);

    let task = specpilot_test_utils::builders::task("a");
    assert_eq!(executor.timeout_for(&task), None);

    let (sink, _seen) = recording_sink();
    let agg = with_timeout(run_tasks(vec![task], 1, executor, sink)).await?;
    assert!(agg.all_passed());
    Ok(())
}
