//! Shared test setup.

use tracing_subscriber::EnvFilter;

/// Route `tracing` output (enabled with `--features tracing`) to the test
/// writer, filtered by `RUST_LOG`.
pub fn setup() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
