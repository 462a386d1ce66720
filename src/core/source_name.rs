//! Hierarchical, dot-separated source names

use super::error::{LoggerError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Name of a logging source, e.g. `"App.Storage.Cache"`.
///
/// Equality is ordinal and case-sensitive. Ordering is ordinal on the full
/// string, which places every ancestor before its descendants (a prefix sorts
/// before any extension of itself).
///
/// # Example
///
/// ```
/// use rust_log_facade::SourceName;
///
/// let name = SourceName::new("App.Storage.Cache").unwrap();
/// assert_eq!(name.parent().unwrap().as_str(), "App.Storage");
/// assert!(name.matches(&SourceName::new("App").unwrap()));
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SourceName {
    name: Arc<str>,
}

impl SourceName {
    pub const SEPARATOR: char = '.';

    pub fn new(name: impl AsRef<str>) -> Result<Self> {
        let name = name.as_ref();
        if name.is_empty() {
            return Err(LoggerError::source_name(name, "name is empty"));
        }
        if name.split(Self::SEPARATOR).any(str::is_empty) {
            return Err(LoggerError::source_name(name, "name contains an empty segment"));
        }

        Ok(Self { name: Arc::from(name) })
    }

    /// Name derived from the module path of `T`, e.g. `app::storage::Cache`
    /// becomes `app.storage`. Types at a crate root use the crate name.
    pub fn of<T: ?Sized>() -> Self {
        let type_name = std::any::type_name::<T>();
        // Generic arguments may contain `::` themselves
        let path = type_name.split('<').next().unwrap_or(type_name);
        let module = match path.rfind("::") {
            Some(idx) => &path[..idx],
            None => path,
        };
        let dotted = module.replace("::", ".");

        Self { name: Arc::from(dotted) }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn parts(&self) -> impl Iterator<Item = &str> {
        self.name.split(Self::SEPARATOR)
    }

    pub fn depth(&self) -> usize {
        self.parts().count()
    }

    /// All but the last segment, or `None` for a single-segment name
    pub fn parent(&self) -> Option<SourceName> {
        self.name.rfind(Self::SEPARATOR).map(|idx| Self {
            name: Arc::from(&self.name[..idx]),
        })
    }

    /// The name itself followed by each of its parents, most specific first
    pub fn ancestors(&self) -> Ancestors {
        Ancestors {
            next: Some(self.clone()),
        }
    }

    /// True if `self` equals `other` or is one of its parents
    pub fn is_ancestor_of(&self, other: &SourceName) -> bool {
        let (anc, desc) = (self.as_str(), other.as_str());
        match desc.strip_prefix(anc) {
            Some("") => true,
            Some(rest) => rest.starts_with(Self::SEPARATOR),
            None => false,
        }
    }

    /// True if a filter registered for `filter` applies to this name
    #[inline]
    pub fn matches(&self, filter: &SourceName) -> bool {
        filter.is_ancestor_of(self)
    }
}

pub struct Ancestors {
    next: Option<SourceName>,
}

impl Iterator for Ancestors {
    type Item = SourceName;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        self.next = current.parent();
        Some(current)
    }
}

impl Ord for SourceName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl PartialOrd for SourceName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Debug for SourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourceName({:?})", &*self.name)
    }
}

impl AsRef<str> for SourceName {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

impl FromStr for SourceName {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<&str> for SourceName {
    type Error = LoggerError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<String> for SourceName {
    type Error = LoggerError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&String> for SourceName {
    type Error = LoggerError;

    fn try_from(value: &String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&SourceName> for SourceName {
    type Error = LoggerError;

    fn try_from(value: &SourceName) -> Result<Self> {
        Ok(value.clone())
    }
}

impl Serialize for SourceName {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name)
    }
}

impl<'de> Deserialize<'de> for SourceName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        SourceName::new(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> SourceName {
        SourceName::new(s).unwrap()
    }

    #[test]
    fn test_equality_is_case_sensitive() {
        assert_eq!(name("App.Storage.Tests"), name("App.Storage.Tests"));
        assert_ne!(name("App.Storage.Tests"), name("app.storage.tests"));
    }

    #[test]
    fn test_rejects_malformed_names() {
        assert!(SourceName::new("").is_err());
        assert!(SourceName::new("App..Storage").is_err());
        assert!(SourceName::new(".App").is_err());
        assert!(SourceName::new("App.").is_err());
    }

    #[test]
    fn test_ordering_is_ordinal() {
        assert!(name("A") < name("B"));
        assert!(name("A") < name("a"));
        assert!(name("App.Storage.Tests") < name("App.Storage.Trace"));
    }

    #[test]
    fn test_ancestors_sort_before_descendants() {
        assert!(name("App") < name("App.Storage"));
        assert!(name("App.Storage") < name("App.Storage.Trace"));
        assert!(name("App") < name("App.Storage.Trace"));
    }

    #[test]
    fn test_parent() {
        assert_eq!(name("App.Storage.Tests").parent(), Some(name("App.Storage")));
        assert_eq!(name("App.Storage").parent(), Some(name("App")));
        assert_eq!(name("App").parent(), None);
    }

    #[test]
    fn test_ancestors_most_specific_first() {
        let chain: Vec<String> = name("A.B.C").ancestors().map(|n| n.to_string()).collect();
        assert_eq!(chain, vec!["A.B.C", "A.B", "A"]);
    }

    #[test]
    fn test_matches_filter() {
        let source = name("App.Storage.Trace");
        let cases = [
            ("App.Storage.Trace", true),
            ("App.Storage", true),
            ("App", true),
            ("Ap", false),
            ("App.Storage.Trace.Tests", false),
            ("App.Storage.Tests", false),
            ("Other", false),
        ];

        for (filter, expected) in cases {
            assert_eq!(source.matches(&name(filter)), expected, "filter {}", filter);
        }
    }

    #[test]
    fn test_of_type_uses_module_path() {
        struct Local;
        let derived = SourceName::of::<Local>();
        assert!(derived.as_str().starts_with("rust_log_facade.core.source_name"));
        assert!(!derived.as_str().contains("::"));
    }

    #[test]
    fn test_serde_validates() {
        let parsed: SourceName = serde_json::from_str("\"App.Web\"").unwrap();
        assert_eq!(parsed, name("App.Web"));
        assert!(serde_json::from_str::<SourceName>("\"App..Web\"").is_err());
    }
}
