//! Tracing subscriber setup for binaries and tools embedding the engine

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Directive used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info";

/// Install a compact stderr subscriber filtered by `RUST_LOG`
///
/// Falls back to [`DEFAULT_FILTER`]. Fails if a global subscriber is already
/// set.
pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_with(DEFAULT_FILTER)
}

/// Like [`init`], with `default_filter` used when `RUST_LOG` is unset
pub fn init_with(default_filter: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .compact();

    let filter_layer =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_filter))?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
