//! Tracing subscriber setup

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LedgerConfig, LogFormat};
use crate::error::AppError;

/// Builds the filter: RUST_LOG when set, otherwise the configured level
pub fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global tracing subscriber
///
/// # Errors
///
/// `AppError::Telemetry` if a global subscriber is already installed
pub fn init_tracing(config: &LedgerConfig) -> Result<(), AppError> {
    let (plain, json) = match config.log_format {
        LogFormat::Pretty => (Some(fmt::layer().with_target(true)), None),
        LogFormat::Json => (None, Some(fmt::layer().json().with_current_span(true))),
    };

    tracing_subscriber::registry()
        .with(env_filter(&config.log_level))
        .with(plain)
        .with(json)
        .try_init()
        .map_err(|e| AppError::Telemetry(e.to_string()))
}
