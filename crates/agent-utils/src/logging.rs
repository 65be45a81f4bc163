//! Logging and tracing utilities

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing subscriber with default configuration
///
/// Uses `RUST_LOG` when set, otherwise `info`.
pub fn init_tracing() {
    init_tracing_with_level("info");
}

/// Initialize tracing with a fallback level used when `RUST_LOG` is unset
///
/// Calling this more than once is a no-op.
pub fn init_tracing_with_level(level: &str) {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init();
}
