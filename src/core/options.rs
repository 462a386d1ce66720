//! Serializable factory configuration

use super::dispatch::DEFAULT_DRAIN_INTERVAL;
use super::error::{LoggerError, Result};
use super::level_filter::LevelFilterResolver;
use super::log_level::LogLevel;
use super::shutdown::DEFAULT_SHUTDOWN_TIMEOUT;
use super::source_name::SourceName;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Minimum level for a source and everything below it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterEntry {
    pub source: SourceName,
    pub level: LogLevel,
}

/// Options a [`LogFactory`](crate::LogFactory) is built from.
///
/// # Example
///
/// ```
/// use rust_log_facade::{LogFactoryOptions, LogLevel};
///
/// let options = LogFactoryOptions::from_json(r#"{
///     "default_level": "Warning",
///     "filters": [{ "source": "App.Storage", "level": "Debug" }],
///     "drain_interval_ms": 50
/// }"#).unwrap();
///
/// assert_eq!(options.default_level, LogLevel::Warning);
/// assert_eq!(options.filters.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogFactoryOptions {
    pub default_level: LogLevel,
    pub filters: Vec<FilterEntry>,
    pub drain_interval_ms: u64,
    pub shutdown_timeout_ms: u64,
}

impl Default for LogFactoryOptions {
    fn default() -> Self {
        Self {
            default_level: LogLevel::Information,
            filters: Vec::new(),
            drain_interval_ms: DEFAULT_DRAIN_INTERVAL.as_millis() as u64,
            shutdown_timeout_ms: DEFAULT_SHUTDOWN_TIMEOUT.as_millis() as u64,
        }
    }
}

impl LogFactoryOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn drain_interval(&self) -> Duration {
        Duration::from_millis(self.drain_interval_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.drain_interval_ms == 0 {
            return Err(LoggerError::config(
                "drain_interval_ms",
                "drain interval must be greater than zero",
            ));
        }
        self.resolver().map(|_| ())
    }

    /// Build the filter table; fails on duplicate sources
    pub fn resolver(&self) -> Result<LevelFilterResolver> {
        let mut resolver = LevelFilterResolver::new(self.default_level);
        for filter in &self.filters {
            resolver.add_filter(filter.source.clone(), filter.level)?;
        }
        Ok(resolver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = LogFactoryOptions::default();
        assert_eq!(options.default_level, LogLevel::Information);
        assert_eq!(options.drain_interval(), Duration::from_millis(100));
        assert_eq!(options.shutdown_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let options = LogFactoryOptions::from_json(r#"{ "default_level": "Error" }"#).unwrap();
        assert_eq!(options.default_level, LogLevel::Error);
        assert_eq!(options.drain_interval_ms, 100);
    }

    #[test]
    fn test_duplicate_filters_rejected() {
        let err = LogFactoryOptions::from_json(
            r#"{ "filters": [
                { "source": "App", "level": "Debug" },
                { "source": "App", "level": "Error" }
            ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_malformed_source_rejected() {
        let err = LogFactoryOptions::from_json(
            r#"{ "filters": [{ "source": "App..Web", "level": "Debug" }] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, LoggerError::JsonError(_)));
    }

    #[test]
    fn test_zero_drain_interval_rejected() {
        let err = LogFactoryOptions::from_json(r#"{ "drain_interval_ms": 0 }"#).unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }
}
