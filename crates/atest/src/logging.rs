//! Test log output.
//!
//! Diagnostics and harness events are emitted through `tracing`. This module
//! installs a `tracing-subscriber` fmt layer that writes through libtest's
//! capture, so the log lines of a test are shown alongside its failure and
//! swallowed when it passes.
//!
//! # Example
//!
//! ```rust
//! use atest::logging::{init_test_logging, LogConfig};
//!
//! init_test_logging(&LogConfig::verbose()).unwrap();
//! tracing::debug!(endpoint = "/users", "sending request");
//! ```

use crate::error::{HarnessError, HarnessResult};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Whether a subscriber should be installed at all.
    pub enabled: bool,

    /// Filter directive (e.g., "info", "atest=debug").
    pub level: String,

    /// Whether to output JSON lines instead of human-readable text.
    pub json_format: bool,

    /// Whether to include file/line info.
    pub file_line_info: bool,

    /// Whether to include target (module path).
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            json_format: false,
            file_line_info: false,
            include_target: true,
        }
    }
}

impl LogConfig {
    /// Debug-level output with source locations.
    #[must_use]
    pub fn verbose() -> Self {
        Self {
            enabled: true,
            level: "debug".to_string(),
            json_format: false,
            file_line_info: true,
            include_target: true,
        }
    }

    /// No subscriber is installed.
    #[must_use]
    pub fn quiet() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Builds the filter described by `level`.
    pub fn filter(&self) -> HarnessResult<EnvFilter> {
        EnvFilter::try_new(&self.level)
            .map_err(|e| HarnessError::invalid_config("log.level", e.to_string()))
    }
}

/// Installs the test subscriber.
///
/// Only the first successful call in a process installs anything; later
/// calls are no-ops, so every test may call this freely.
///
/// # Errors
///
/// Returns `HarnessError::InvalidConfig` if the level cannot be parsed.
pub fn init_test_logging(config: &LogConfig) -> HarnessResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = config.filter()?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .with_file(config.file_line_info)
        .with_line_number(config.file_line_info)
        .with_target(config.include_target);

    let installed = if config.json_format {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if installed.is_err() {
        tracing::trace!("test subscriber already installed");
    }

    Ok(())
}
