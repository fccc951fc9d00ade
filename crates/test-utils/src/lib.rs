pub mod builders;
pub mod fakes;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

/// Upper bound for any single awaited step in a test. Real child processes
/// are involved, so this is generous.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// How often [`wait_until`] re-checks its condition.
const POLL_EVERY: Duration = Duration::from_millis(20);

static INIT: Once = Once::new();

/// Route `tracing` output through the test harness.
///
/// Output only shows for failing tests (or with `--nocapture`). The filter
/// comes from `RUST_LOG`, falling back to `warden=debug` so supervisor and
/// reconciler decisions are visible when a test fails.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("warden=debug"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(false)
            .init();
    });
}

/// Await `f`, panicking if it takes longer than [`TEST_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(TEST_TIMEOUT, f).await {
        Ok(value) => value,
        Err(_) => panic!("test step did not finish within {TEST_TIMEOUT:?}"),
    }
}

/// Poll `condition` until it holds, panicking after [`TEST_TIMEOUT`].
///
/// For state owned by child processes or background tasks (pids, files
/// written by a job) that the test cannot await directly.
pub async fn wait_until<F>(what: &str, mut condition: F)
where
    F: FnMut() -> bool,
{
    let polling = async {
        while !condition() {
            tokio::time::sleep(POLL_EVERY).await;
        }
    };
    if tokio::time::timeout(TEST_TIMEOUT, polling).await.is_err() {
        panic!("timed out waiting for {what}");
    }
}
