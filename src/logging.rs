//! Logging setup.
//!
//! Library code only emits `tracing` events; installing a subscriber is the
//! embedding application's call. This helper installs a formatted one.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a global fmt subscriber. `RUST_LOG` wins over `default_filter`.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_logging(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
        .is_ok()
}
