pub mod config;
pub mod error;

pub use self::config::{Config, DateConfig, NaiveZone, ProviderConfig, ServerConfig, ValidationResult};
pub use self::error::{AppError, ConfigError, NetworkError, ReqwestErrorExt};

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise the level is `info`, or `debug`
/// when the service runs with `API_DEBUG` set.
pub fn init(debug: bool) -> Result<(), AppError> {
    let default_level = if debug { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .try_init()
        .map_err(|e| AppError::Other(anyhow::anyhow!("failed to install tracing subscriber: {e}")))?;

    tracing::info!("wxmerge core initialized");
    Ok(())
}
