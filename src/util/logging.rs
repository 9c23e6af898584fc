//! Tracing subscriber setup.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding the `EnvFilter` directive.
pub const LOG_ENV: &str = "XFORMSTACK_LOG";

/// Install a fmt subscriber filtered by `XFORMSTACK_LOG` (default `warn`).
///
/// Returns false if a global subscriber is already installed.
pub fn init_tracing() -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_test_writer());

    tracing::subscriber::set_global_default(subscriber).is_ok()
}
