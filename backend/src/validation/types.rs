//! Data-type predicates keyed by type tag.
//!
//! A [`TypeRegistry`] is an owned table, not global state: each compiled
//! schema carries its own copy, seeded with the default tags and extended
//! with any pattern types the configuration declares. Callers may register,
//! replace or remove predicates between extraction passes; clone the
//! registry to share it across threads.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

/// Tag for whole numbers.
pub const INTEGER: &str = "integer";

/// Tag for ARK persistent identifiers (`ark:/<naan>/<name>`).
pub const ARK_IDENTIFIER: &str = "ark-identifier";

static INTEGER_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[+-]?[0-9]+$").ok());

static ARK_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)^ark:/[a-z0-9]+/[a-z0-9]+$").ok());

/// A value predicate. Receives the trimmed cell text.
pub type Predicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Valid iff the trimmed text parses as an integer.
pub fn is_integer(value: &str) -> bool {
    let value = value.trim();
    INTEGER_PATTERN.as_ref().is_some_and(|re| re.is_match(value))
}

/// Valid iff the text is `ark:/<alphanumeric>/<alphanumeric>`, ignoring case.
pub fn is_ark_identifier(value: &str) -> bool {
    let value = value.trim();
    ARK_PATTERN.as_ref().is_some_and(|re| re.is_match(value))
}

/// Table of type predicates. Tags are case-insensitive.
#[derive(Clone)]
pub struct TypeRegistry {
    validators: BTreeMap<String, Predicate>,
}

impl TypeRegistry {
    /// Registry with no predicates at all.
    pub fn empty() -> Self {
        Self { validators: BTreeMap::new() }
    }

    /// Registry seeded with `integer` and `ark-identifier`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(INTEGER, is_integer);
        registry.register(ARK_IDENTIFIER, is_ark_identifier);
        registry
    }

    /// Register or replace the predicate for `tag`. Returns the predicate it replaced.
    pub fn register<F>(&mut self, tag: impl AsRef<str>, predicate: F) -> Option<Predicate>
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.validators.insert(normalize_tag(tag.as_ref()), Arc::new(predicate))
    }

    /// Register a type whose values must fully match a regular expression.
    pub fn register_pattern(&mut self, tag: impl AsRef<str>, pattern: &str) -> Result<(), regex::Error> {
        let re = Regex::new(pattern)?;
        self.register(tag, move |value: &str| re.is_match(value.trim()));
        Ok(())
    }

    /// Remove the predicate for `tag`. Returns whether one was registered.
    pub fn remove(&mut self, tag: &str) -> bool {
        self.validators.remove(&normalize_tag(tag)).is_some()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.validators.contains_key(&normalize_tag(tag))
    }

    /// Registered tags, sorted.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.validators.keys().map(String::as_str)
    }

    /// Run the predicate for `tag`; `None` when the tag is not registered.
    pub fn check(&self, tag: &str, value: &str) -> Option<bool> {
        self.validators.get(&normalize_tag(tag)).map(|predicate| predicate(value))
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.validators.keys()).finish()
    }
}

/// Canonical form of a type tag.
pub fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer() {
        assert!(is_integer("42"));
        assert!(is_integer(" -7 "));
        assert!(is_integer("+3"));
        assert!(!is_integer("4.2"));
        assert!(!is_integer("forty"));
        assert!(!is_integer(""));
    }

    #[test]
    fn test_ark_identifier() {
        assert!(is_ark_identifier("ark:/81431/p3gf0p"));
        assert!(is_ark_identifier("ARK:/81431/P3GF0P"));
        assert!(!is_ark_identifier("ark:/81431"));
        assert!(!is_ark_identifier("ark:/81431/p3-gf0p"));
        assert!(!is_ark_identifier("http://n2t.net/ark:/81431/p3gf0p"));
    }

    #[test]
    fn test_defaults_registered() {
        let registry = TypeRegistry::default();
        let tags: Vec<&str> = registry.tags().collect();
        assert_eq!(tags, vec!["ark-identifier", "integer"]);
        assert_eq!(registry.check("Integer", "12"), Some(true));
        assert_eq!(registry.check("date", "2020-01-01"), None);
    }

    #[test]
    fn test_register_replace_remove() {
        let mut registry = TypeRegistry::with_defaults();

        assert!(registry.register("even", |v: &str| v.parse::<i64>().is_ok_and(|n| n % 2 == 0)).is_none());
        assert_eq!(registry.check("even", "4"), Some(true));
        assert_eq!(registry.check("even", "5"), Some(false));

        // Replacing changes subsequent checks
        assert!(registry.register("integer", |_: &str| false).is_some());
        assert_eq!(registry.check("integer", "1"), Some(false));

        assert!(registry.remove("EVEN"));
        assert!(!registry.contains("even"));
        assert!(!registry.remove("even"));
    }

    #[test]
    fn test_register_pattern() {
        let mut registry = TypeRegistry::empty();
        registry.register_pattern("shelfmark", r"^MS [0-9]+$").unwrap();

        assert_eq!(registry.check("shelfmark", " MS 12 "), Some(true));
        assert_eq!(registry.check("shelfmark", "Codex 12"), Some(false));
        assert!(registry.register_pattern("broken", "([").is_err());
    }
}
