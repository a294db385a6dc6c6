//! Logging setup for the CLI.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError, EnvFilter,
};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to install tracing subscriber: {0}")]
    SubscriberInstall(#[from] TryInitError),
}

/// Available output formats for the logger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Install the global tracing subscriber. Logs go to stderr so stdout stays
/// machine-readable. `RUST_LOG` takes precedence over `level`.
///
/// # Errors
///
/// Returns [`LoggingError::SubscriberInstall`] when a global subscriber is
/// already set.
pub fn init_logging(level: &str, format: LogFormat) -> Result<(), LoggingError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr).with_target(false))
            .try_init()?,
        LogFormat::Pretty => registry
            .with(fmt::layer().compact().with_writer(std::io::stderr).with_target(false))
            .try_init()?,
    }
    Ok(())
}
