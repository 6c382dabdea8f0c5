//! Logging infrastructure for Searchgate
//!
//! Centralized logging configuration built on the tracing ecosystem.

use crate::{GatewayError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Logger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Whether to use JSON format
    pub json_format: bool,
    /// Whether to include file/line information
    pub with_file_info: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            with_file_info: false,
        }
    }
}

/// Initialize the global logger with the given configuration
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let level = Level::from_str(&config.level).map_err(|e| {
        GatewayError::invalid_config(format!("invalid log level '{}': {}", config.level, e))
    })?;

    let env_filter = EnvFilter::from_default_env()
        .add_directive(level.into())
        .add_directive("hyper=warn".parse().unwrap())
        .add_directive("reqwest=warn".parse().unwrap())
        .add_directive("h2=warn".parse().unwrap());

    let fmt_layer = if config.json_format {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_file(config.with_file_info)
            .with_line_number(config.with_file_info)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_file(config.with_file_info)
            .with_line_number(config.with_file_info)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| {
            GatewayError::invalid_config(format!("failed to initialize logger: {}", e))
        })?;

    tracing::info!("Logger initialized with level: {}", config.level);
    Ok(())
}

/// Initialize the logger for tests, ignoring double-init errors
pub fn init_test_logging() {
    let config = LoggingConfig {
        level: "warn".to_string(),
        json_format: false,
        with_file_info: false,
    };
    let _ = init_logging(&config);
}
