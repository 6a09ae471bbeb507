use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to initialize tracing: {0}")]
    InitError(String),
}

/// Initialize structured JSON logging for the daemon.
///
/// The filter is taken from `RUST_LOG` when set, defaulting to info with
/// debug output for the relayer's own crates.
pub fn init_tracing() -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,median_relay=debug"));

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .json();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| TelemetryError::InitError(e.to_string()))?;

    Ok(())
}
