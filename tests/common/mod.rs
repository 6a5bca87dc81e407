pub mod mocks;

use std::sync::Once;

static TRACING: Once = Once::new();

/// Route engine logs through the test harness writer so `--nocapture` shows
/// them. Idempotent; call at the top of any test that wants log output.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("bioscout=debug")),
            )
            .with_test_writer()
            .try_init();
    });
}
