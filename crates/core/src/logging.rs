//! Structured logging infrastructure.
//!
//! This module provides centralized logging initialization with support
//! for structured JSON output and environment-based configuration.

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{CoreError, CoreResult};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the level filter. `RUST_LOG` wins over the configured level.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    let from_env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    build_filter(from_env.as_deref(), &config.level)
}

fn build_filter(env_directives: Option<&str>, level: &str) -> EnvFilter {
    env_directives
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(level))
}

/// Initialize the logging system with the configured output format.
///
/// Fails if a global subscriber has already been installed.
///
/// # Example
/// ```no_run
/// use pwex_core::{logging, LoggingConfig};
///
/// logging::init(&LoggingConfig::default()).unwrap();
/// tracing::info!("Application started");
/// ```
pub fn init(config: &LoggingConfig) -> CoreResult<()> {
    let filter = env_filter(config);
    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.format {
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(true))
            .try_init(),
    };

    result.map_err(|e| CoreError::Logging(e.to_string()))
}
