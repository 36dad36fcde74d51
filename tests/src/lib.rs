//! Paygate Testing Framework
//!
//! Mock actions, extensions and apis for exercising gateways without a
//! payment provider behind them.

pub mod extension;

pub use action::{MockAction, TestRequest};
pub use api::MockApi;
pub use extension::{HookEvent, MockExtension};

/// Install a test subscriber writing to the test harness output.
///
/// Safe to call from every test; only the first call installs it.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("paygate=debug")),
        )
        .with_test_writer()
        .try_init();
}

#[macro_export]
macro_rules! assert_action_called {
    ($action:expr, $expected_count:expr) => {
        let count = $action.call_count();
        assert_eq!(
            count, $expected_count,
            "Expected action '{}' to be called {} times, but was called {} times",
            $action.label(),
            $expected_count,
            count
        );
    };
}
