//! Per-source minimum level resolution

use super::error::{LoggerError, Result};
use super::log_level::LogLevel;
use super::source_name::SourceName;
use std::collections::BTreeMap;

/// Table of source filters plus a fallback level.
///
/// Filled while a factory is being configured and read-only afterwards.
///
/// # Example
///
/// ```
/// use rust_log_facade::{LevelFilterResolver, LogLevel, SourceName};
///
/// let mut filters = LevelFilterResolver::new(LogLevel::Information);
/// filters.add_filter(SourceName::new("App").unwrap(), LogLevel::Warning).unwrap();
///
/// let level = filters.resolve(&SourceName::new("App.Storage").unwrap());
/// assert_eq!(level, LogLevel::Warning);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LevelFilterResolver {
    filters: BTreeMap<SourceName, LogLevel>,
    default_level: LogLevel,
}

impl LevelFilterResolver {
    pub fn new(default_level: LogLevel) -> Self {
        Self {
            filters: BTreeMap::new(),
            default_level,
        }
    }

    pub fn default_level(&self) -> LogLevel {
        self.default_level
    }

    pub fn set_default_level(&mut self, level: LogLevel) {
        self.default_level = level;
    }

    /// Register a minimum level for `source` and everything below it.
    ///
    /// Each source may only be registered once.
    pub fn add_filter(&mut self, source: SourceName, level: LogLevel) -> Result<()> {
        if self.filters.contains_key(&source) {
            return Err(LoggerError::config(
                "filters",
                format!("duplicate entry for '{}'", source),
            ));
        }
        self.filters.insert(source, level);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn filters(&self) -> impl Iterator<Item = (&SourceName, LogLevel)> {
        self.filters.iter().map(|(name, level)| (name, *level))
    }

    /// Level of the closest registered ancestor of `source` (the name itself
    /// included), or the default level when nothing matches.
    pub fn resolve(&self, source: &SourceName) -> LogLevel {
        source
            .ancestors()
            .find_map(|ancestor| self.filters.get(&ancestor).copied())
            .unwrap_or(self.default_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> SourceName {
        SourceName::new(s).unwrap()
    }

    fn resolver(default: LogLevel, filters: &[(&str, LogLevel)]) -> LevelFilterResolver {
        let mut resolver = LevelFilterResolver::new(default);
        for (source, level) in filters {
            resolver.add_filter(name(source), *level).unwrap();
        }
        resolver
    }

    #[test]
    fn test_best_match_wins() {
        let r = resolver(
            LogLevel::Information,
            &[("App", LogLevel::Warning), ("App.Storage.Trace", LogLevel::Critical)],
        );

        assert_eq!(r.resolve(&name("App.Storage.Trace.Tests")), LogLevel::Critical);
        assert_eq!(r.resolve(&name("App.Other")), LogLevel::Warning);
        assert_eq!(r.resolve(&name("Unrelated")), LogLevel::Information);
    }

    #[test]
    fn test_exact_match() {
        let r = resolver(LogLevel::Information, &[("App.Storage", LogLevel::Error)]);
        assert_eq!(r.resolve(&name("App.Storage")), LogLevel::Error);
    }

    #[test]
    fn test_descendant_filter_does_not_apply_to_parent() {
        let r = resolver(LogLevel::Information, &[("App.Storage.Trace", LogLevel::Debug)]);
        assert_eq!(r.resolve(&name("App.Storage")), LogLevel::Information);
    }

    #[test]
    fn test_siblings_and_case_never_match() {
        let r = resolver(
            LogLevel::Information,
            &[("App.Storage.Tests", LogLevel::Debug), ("app", LogLevel::Error)],
        );
        assert_eq!(r.resolve(&name("App.Storage.Trace")), LogLevel::Information);
        assert_eq!(r.resolve(&name("App")), LogLevel::Information);
    }

    #[test]
    fn test_segment_prefix_is_not_an_ancestor() {
        let r = resolver(LogLevel::Information, &[("Ap", LogLevel::Error)]);
        assert_eq!(r.resolve(&name("App.Storage")), LogLevel::Information);
    }

    #[test]
    fn test_duplicate_filter_rejected() {
        let mut r = LevelFilterResolver::new(LogLevel::Information);
        r.add_filter(name("App"), LogLevel::Warning).unwrap();
        let err = r.add_filter(name("App"), LogLevel::Error).unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
        assert_eq!(r.resolve(&name("App")), LogLevel::Warning);
    }

    #[test]
    fn test_none_filter_turns_source_off() {
        let r = resolver(LogLevel::Information, &[("App", LogLevel::None)]);
        let level = r.resolve(&name("App.Storage"));
        assert!(!LogLevel::Critical.passes(level));
    }
}
