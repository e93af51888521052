//! Log subscriber setup for the binary.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};
use crate::error::AppError;

/// Build the filter: `RUST_LOG` wins, then `--verbose`, then the configured level.
fn filter(config: &LoggingConfig, verbose: bool) -> Result<EnvFilter, AppError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let level = if verbose { "debug" } else { config.level.as_str() };
    EnvFilter::try_new(format!("barcode_reader={level},{level}"))
        .map_err(|e| AppError::Logging(format!("invalid log level '{level}': {e}")))
}

/// Install the global subscriber. Logs go to stderr so stdout stays usable
/// for listings and summaries.
pub fn init_logging(config: &LoggingConfig, verbose: bool) -> Result<(), AppError> {
    let filter = filter(config, verbose)?;
    let registry = tracing_subscriber::registry().with(filter);
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_thread_names(true);

    let result = match config.format {
        LogFormat::Pretty => registry.with(layer.pretty()).try_init(),
        LogFormat::Compact => registry.with(layer.compact().with_target(false)).try_init(),
        LogFormat::Json => registry.with(layer.json()).try_init(),
    };
    result.map_err(|e| AppError::Logging(e.to_string()))
}
