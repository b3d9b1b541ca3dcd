//! Test context configuration.

use crate::error::{HarnessError, HarnessResult};
use crate::logging::LogConfig;
use serde::Deserialize;

/// Configuration for a [`TestContext`](crate::TestContext).
///
/// # Example
///
/// ```
/// use atest::{ContextConfig, LogConfig};
///
/// let config = ContextConfig::default()
///     .with_skip(1)
///     .with_dir_prefix("upload-test")
///     .with_log(LogConfig::verbose());
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// How many innermost frames of a failure's call path to leave out.
    pub skip: usize,

    /// When set, a fresh temporary directory with this prefix is created.
    pub dir_prefix: Option<String>,

    /// Log output settings.
    pub log: LogConfig,

    /// Panic when a context with unreported failures is dropped.
    pub panic_on_unfinished: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            skip: 0,
            dir_prefix: None,
            log: LogConfig::default(),
            panic_on_unfinished: true,
        }
    }
}

impl ContextConfig {
    /// Parses a configuration from JSON text.
    pub fn from_json(text: &str) -> HarnessResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the skip count.
    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    /// Requests a temporary directory with the given name prefix.
    pub fn with_dir_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.dir_prefix = Some(prefix.into());
        self
    }

    /// Sets the log configuration.
    pub fn with_log(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    /// Sets whether dropping a context with unreported failures panics.
    pub fn with_panic_on_unfinished(mut self, enabled: bool) -> Self {
        self.panic_on_unfinished = enabled;
        self
    }

    /// Checks the configuration for values that cannot work.
    pub fn validate(&self) -> HarnessResult<()> {
        if let Some(prefix) = &self.dir_prefix {
            if prefix.contains(['/', '\\']) {
                return Err(HarnessError::invalid_config(
                    "dir_prefix",
                    "must not contain path separators",
                ));
            }
        }
        if self.log.enabled {
            self.log.filter()?;
        }
        Ok(())
    }
}
