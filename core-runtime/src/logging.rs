//! # Logging & Tracing Infrastructure
//!
//! Configures the `tracing-subscriber` stack for the core crates:
//! - Pretty, JSON, or compact output formats
//! - Module-level filtering via an `EnvFilter` expression
//! - Safe repeated initialization (later calls are no-ops)
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
//!
//! let config = LoggingConfig::default()
//!     .with_format(LogFormat::Pretty)
//!     .with_filter("core_audio=debug,core_offline=debug");
//! init_logging(config)?;
//!
//! tracing::info!("Application started");
//! ```

use crate::error::{Error, Result};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable pretty format with colors
    Pretty,
    /// Structured JSON format for machine parsing
    Json,
    /// Compact format for production
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        #[cfg(debug_assertions)]
        return Self::Pretty;

        #[cfg(not(debug_assertions))]
        return Self::Json;
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Output format
    pub format: LogFormat,
    /// Default level when no filter is supplied (e.g. "info")
    pub level: String,
    /// Custom filter string (e.g., "core_audio=debug,core_offline=trace")
    pub filter: Option<String>,
    /// Display target module in logs
    pub display_target: bool,
    /// Display thread info
    pub display_thread_info: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: "info".to_string(),
            filter: None,
            display_target: true,
            display_thread_info: false,
        }
    }
}

impl LoggingConfig {
    /// Set log format
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the default level
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Set a custom filter expression
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Toggle target display
    pub fn with_target(mut self, display: bool) -> Self {
        self.display_target = display;
        self
    }

    fn env_filter(&self) -> Result<EnvFilter> {
        let directives = self.filter.clone().unwrap_or_else(|| self.level.clone());
        EnvFilter::try_new(&directives)
            .map_err(|e| Error::Config(format!("log filter '{}': {}", directives, e)))
    }
}

/// Initialize the global tracing subscriber.
///
/// Honors `RUST_LOG` when set, falling back to the configured filter. Calling
/// this more than once is harmless; only the first call installs a subscriber.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(env) => env,
        Err(_) => config.env_filter()?,
    };

    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_target(config.display_target)
                    .with_thread_names(config.display_thread_info),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(config.display_target)
                    .with_thread_names(config.display_thread_info),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_target(config.display_target)
                    .with_thread_names(config.display_thread_info),
            )
            .try_init(),
    };

    // A subscriber installed by the host (or an earlier call) is fine.
    if let Err(e) = result {
        tracing::debug!("Logging already initialized: {}", e);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level("debug")
            .with_filter("core_audio=trace")
            .with_target(false);

        assert_eq!(config.format, LogFormat::Compact);
        assert_eq!(config.level, "debug");
        assert_eq!(config.filter.as_deref(), Some("core_audio=trace"));
        assert!(!config.display_target);
    }

    #[test]
    fn test_invalid_filter_is_rejected() {
        let config = LoggingConfig::default().with_filter("core_audio=notalevel");
        assert!(config.env_filter().is_err());
    }

    #[test]
    fn test_repeated_init_is_harmless() {
        init_logging(LoggingConfig::default()).unwrap();
        init_logging(LoggingConfig::default()).unwrap();
    }
}
