//! Logging setup for the solver.

use anyhow::{anyhow, Result};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "info,handheld_cli=debug";

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
///
/// Logs go to stderr so stdout carries only the report.
pub fn init_telemetry(verbose: bool) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            "debug".into()
        } else {
            DEFAULT_FILTER.into()
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {}", e))?;

    debug!("Telemetry initialized");
    Ok(())
}
