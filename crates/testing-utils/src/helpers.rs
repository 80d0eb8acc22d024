//! Test helper utilities and common testing patterns

/// Test environment setup utilities
pub struct TestEnv;

impl TestEnv {
    /// Install a test-writer tracing subscriber; repeated calls are no-ops
    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    }
}
