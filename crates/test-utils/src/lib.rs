pub mod builders;
pub mod fake_executor;

use std::future::Future;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use specpilot::engine::ProgressSnapshot;
use specpilot::logging::LOG_ENV;
use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Upper bound for any single async test.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Install a test-writer subscriber once per test binary.
///
/// Filter comes from `SPECPILOT_LOG` (same variable the binary reads), then
/// `RUST_LOG`, else `warn`. Output is captured by
/// the harness and only shown for failing tests.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("warn"));

        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// Await `f`, panicking if it takes longer than [`TEST_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(TEST_TIMEOUT, f).await {
        Ok(value) => value,
        Err(_) => panic!("test did not finish within {TEST_TIMEOUT:?}"),
    }
}

/// Progress sink that records every snapshot it receives.
///
/// Returns the sink closure and a handle to read the snapshots back.
pub fn recording_sink() -> (
    impl FnMut(&ProgressSnapshot) + Send + 'static,
    Arc<Mutex<Vec<ProgressSnapshot>>>,
) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink_seen = Arc::clone(&seen);
    let sink = move |s: &ProgressSnapshot| sink_seen.lock().unwrap().push(*s);
    (sink, seen)
}
