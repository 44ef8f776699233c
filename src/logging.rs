//! Logging setup
//!
//! The library only emits `tracing` events. Binaries and tests that want
//! them printed call one of these helpers; both leave an already-installed
//! global subscriber in place.

use tracing_subscriber::EnvFilter;

/// Filter used when neither `RUST_LOG` nor the configuration sets one
pub const DEFAULT_FILTER: &str = "exchanger=info";

fn env_filter(fallback: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback.unwrap_or(DEFAULT_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install a formatted stderr subscriber.
///
/// `RUST_LOG` wins over `fallback` (usually `ExchangeConfig::log_filter`).
/// Returns `false` if a global subscriber was already set.
pub fn init_logging(fallback: Option<&str>) -> bool {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(env_filter(fallback))
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(filter = fallback.unwrap_or(DEFAULT_FILTER), "logging initialized");
    }
    installed
}

/// Install a subscriber that writes through the test harness capture.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(Some("exchanger=debug")))
        .with_test_writer()
        .try_init();
}
