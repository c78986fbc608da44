//! Platform configuration
//!
//! Controls the diagnostic minimum level, the sink, and assert behavior.
//! Loaded from JSON, then optionally overridden from the environment:
//!
//! ```json
//! {
//!   "log": { "min_level": "info", "sink": "tracing" },
//!   "asserts": { "enabled": true, "action": "panic" }
//! }
//! ```
//!
//! Missing fields take the build-profile defaults.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::assert::{AssertAction, ASSERTS_ENABLED};
use crate::log::{LogLevel, LogSink, Logger, TracingSink};

/// Environment variable overriding `log.min_level`
pub const LOG_LEVEL_ENV: &str = "DDP_LOG_LEVEL";

/// Errors raised while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid log level {value:?} in {source_name}")]
    InvalidLevel { source_name: String, value: String },
}

/// Where a configured logger writes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Forward into `tracing`
    #[default]
    Tracing,
    /// Drop all messages
    None,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub min_level: LogLevel,
    pub sink: SinkKind,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::build_default(),
            sink: SinkKind::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssertConfig {
    pub enabled: bool,
    pub action: AssertAction,
}

impl Default for AssertConfig {
    fn default() -> Self {
        Self {
            enabled: ASSERTS_ENABLED,
            action: AssertAction::default(),
        }
    }
}

/// Top-level configuration
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub log: LogConfig,
    pub asserts: AssertConfig,
}

impl PlatformConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Apply `DDP_LOG_LEVEL` if set
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        match std::env::var(LOG_LEVEL_ENV) {
            Ok(value) => self.apply_level_override(LOG_LEVEL_ENV, &value),
            Err(_) => Ok(()),
        }
    }

    fn apply_level_override(&mut self, source_name: &str, value: &str) -> Result<(), ConfigError> {
        self.log.min_level = value.parse().map_err(|_| ConfigError::InvalidLevel {
            source_name: source_name.to_string(),
            value: value.to_string(),
        })?;
        Ok(())
    }

    /// Build a logger using the configured sink kind
    pub fn build_logger(&self) -> Logger {
        let logger = match self.log.sink {
            SinkKind::Tracing => Logger::new(self.log.min_level, Arc::new(TracingSink)),
            SinkKind::None => Logger::silent(self.log.min_level),
        };
        self.apply_asserts(logger)
    }

    /// Build a logger writing to a caller-supplied sink
    pub fn build_logger_with(&self, sink: Arc<dyn LogSink>) -> Logger {
        self.apply_asserts(Logger::new(self.log.min_level, sink))
    }

    fn apply_asserts(&self, logger: Logger) -> Logger {
        logger
            .with_asserts(self.asserts.enabled)
            .with_assert_action(self.asserts.action)
    }
}
