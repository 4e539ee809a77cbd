//! Logging initialization.
//!
//! Diagnostics use the `tracing` ecosystem and are written to stderr, so
//! stdout carries only the summary lines.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the global subscriber.
///
/// `verbose` raises the default level from `warn` to `debug`. `RUST_LOG`
/// overrides both.
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();
}
