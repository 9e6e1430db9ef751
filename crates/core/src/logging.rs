//! Per-component logging configuration.
//!
//! Components receive a [`LogConfig`] at construction instead of reading a
//! process-wide level, so two pipelines in one process can log at different
//! verbosities. Events that pass the component's own level are forwarded to
//! the `log` facade under the configured target.

use log::{Level, LevelFilter};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default log target for conversion components.
pub const DEFAULT_TARGET: &str = "deck";

/// Verbosity and target for one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(with = "level_filter_serde")]
    pub level: LevelFilter,

    #[serde(skip, default = "default_target")]
    pub target: &'static str,
}

fn default_target() -> &'static str {
    DEFAULT_TARGET
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            target: DEFAULT_TARGET,
        }
    }
}

impl LogConfig {
    /// Log at the given maximum level.
    pub fn new(level: LevelFilter) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    /// Emit nothing.
    pub fn silent() -> Self {
        Self::new(LevelFilter::Off)
    }

    /// Use a different `log` target.
    pub fn with_target(mut self, target: &'static str) -> Self {
        self.target = target;
        self
    }

    /// Whether an event at `level` would be emitted.
    pub fn enabled(&self, level: Level) -> bool {
        level <= self.level
    }

    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        if self.enabled(level) {
            log::log!(target: self.target, level, "{}", args);
        }
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, args);
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, args);
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args);
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args);
    }

    pub fn trace(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Trace, args);
    }
}

mod level_filter_serde {
    use log::LevelFilter;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(level: &LevelFilter, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&level.as_str().to_lowercase())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<LevelFilter, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}
