//! Log subscriber installation

use crate::config::LoggingConfig;
use crate::core::error::{ConfigError, MarketResult};
use tracing_subscriber::{EnvFilter, fmt};

/// Install a global `fmt` subscriber
///
/// `RUST_LOG` takes precedence over `logging.filter`. Returns `Ok(false)` when
/// a global subscriber was already installed, which leaves that one in place.
///
/// # Errors
/// `Config` when `logging.filter` is not a valid filter directive.
pub fn init(config: &LoggingConfig) -> MarketResult<bool> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => build_filter(&config.filter)?,
    };

    let installed = fmt::Subscriber::builder()
        .with_target(true)
        .with_env_filter(filter)
        .try_init()
        .is_ok();

    Ok(installed)
}

fn build_filter(directives: &str) -> MarketResult<EnvFilter> {
    EnvFilter::try_new(directives).map_err(|e| {
        ConfigError::InvalidValue {
            field: "logging.filter".to_string(),
            value: directives.to_string(),
            message: e.to_string(),
        }
        .into()
    })
}
