pub mod fixtures;
pub mod transport;

use std::sync::Once;

pub use fixtures::*;
pub use transport::StubTransport;

static TRACING: Once = Once::new();

/// Installs a test-friendly subscriber once per process. Honors `RUST_LOG`.
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "warn".into()),
            )
            .with_test_writer()
            .try_init();
    });
}
