//! Collected validation errors.
//!
//! Errors are grouped by kind, kinds in first-seen order, errors within a
//! kind in the order they were found. Nothing is ever overwritten.
//!
//! Serialized shape:
//!
//! ```json
//! {
//!   "required_value_missing": [{ "address": "B3", "text": "..." }],
//!   "non_valid_integer": [{ "address": "D7", "text": "..." }]
//! }
//! ```

use std::borrow::Cow;
use std::fmt;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

/// Kind of a collected (non-fatal) validation error.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    RequiredHeaderMissing,
    NonUniqueHeader,
    RequiredValueMissing,
    NonUniqueValue,
    /// Failed the predicate of the given type tag.
    NonValid(String),
}

impl ErrorKind {
    pub fn as_tag(&self) -> Cow<'static, str> {
        match self {
            Self::RequiredHeaderMissing => Cow::Borrowed("required_header_missing"),
            Self::NonUniqueHeader => Cow::Borrowed("non_unique_header"),
            Self::RequiredValueMissing => Cow::Borrowed("required_value_missing"),
            Self::NonUniqueValue => Cow::Borrowed("non_unique_value"),
            Self::NonValid(tag) => Cow::Owned(format!("non_valid_{}", tag)),
        }
    }

    /// Header kinds abort the extraction pass.
    pub fn is_header_error(&self) -> bool {
        matches!(self, Self::RequiredHeaderMissing | Self::NonUniqueHeader)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_tag())
    }
}

impl Serialize for ErrorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One collected error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// Grouping key in the report; not repeated in serialized output.
    #[serde(skip)]
    pub kind: ErrorKind,
    /// Grid address (`B3`), or several comma-separated addresses for duplicate headers.
    pub address: Option<String>,
    pub text: String,
}

impl ValidationError {
    pub fn new(kind: ErrorKind, address: Option<String>, text: impl Into<String>) -> Self {
        Self { kind, address, text: text.into() }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.address {
            Some(address) => write!(f, "[{}] {}: {}", self.kind, address, self.text),
            None => write!(f, "[{}] {}", self.kind, self.text),
        }
    }
}

/// Errors of one extraction pass, grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorReport {
    errors: IndexMap<ErrorKind, Vec<ValidationError>>,
}

impl ErrorReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an error under its kind.
    pub fn push(&mut self, error: ValidationError) {
        self.errors.entry(error.kind.clone()).or_default().push(error);
    }

    /// Append an error built from its parts.
    pub fn add(&mut self, kind: ErrorKind, address: Option<String>, text: impl Into<String>) {
        self.push(ValidationError::new(kind, address, text));
    }

    /// Errors of one kind, in the order found.
    pub fn get(&self, kind: &ErrorKind) -> &[ValidationError] {
        self.errors.get(kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Kinds present, in first-seen order.
    pub fn kinds(&self) -> impl Iterator<Item = &ErrorKind> {
        self.errors.keys()
    }

    /// All errors, grouped by kind.
    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.values().flatten()
    }

    pub fn has_header_errors(&self) -> bool {
        self.errors.keys().any(ErrorKind::is_header_error)
    }

    /// Total number of errors across kinds.
    pub fn len(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// One line per kind with its count.
    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(|(kind, errors)| format!("{}: {}", kind, errors.len()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        assert_eq!(ErrorKind::RequiredHeaderMissing.to_string(), "required_header_missing");
        assert_eq!(ErrorKind::NonValid("ark-identifier".into()).to_string(), "non_valid_ark-identifier");
        assert!(ErrorKind::NonUniqueHeader.is_header_error());
        assert!(!ErrorKind::NonUniqueValue.is_header_error());
    }

    #[test]
    fn test_errors_append_in_order() {
        let mut report = ErrorReport::new();
        report.add(ErrorKind::RequiredValueMissing, Some("A2".into()), "first");
        report.add(ErrorKind::NonUniqueValue, Some("B3".into()), "dup");
        report.add(ErrorKind::RequiredValueMissing, Some("A4".into()), "second");

        let missing = report.get(&ErrorKind::RequiredValueMissing);
        assert_eq!(missing.len(), 2);
        assert_eq!(missing[0].text, "first");
        assert_eq!(missing[1].text, "second");
        assert_eq!(report.len(), 3);

        let kinds: Vec<String> = report.kinds().map(ToString::to_string).collect();
        assert_eq!(kinds, vec!["required_value_missing", "non_unique_value"]);
        assert!(!report.has_header_errors());
    }

    #[test]
    fn test_missing_kind_is_empty_slice() {
        let report = ErrorReport::new();
        assert!(report.get(&ErrorKind::NonUniqueHeader).is_empty());
        assert!(report.is_empty());
    }

    #[test]
    fn test_report_serialization() {
        let mut report = ErrorReport::new();
        report.add(ErrorKind::NonValid("integer".into()), Some("C5".into()), "'x' is not a valid integer");
        report.add(ErrorKind::RequiredHeaderMissing, None, "missing");

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["non_valid_integer"][0]["address"], "C5");
        assert!(json["required_header_missing"][0]["address"].is_null());
        assert!(json["non_valid_integer"][0].get("kind").is_none());
    }

    #[test]
    fn test_summary() {
        let mut report = ErrorReport::new();
        report.add(ErrorKind::NonUniqueValue, Some("A3".into()), "dup");
        report.add(ErrorKind::NonUniqueValue, Some("A4".into()), "dup");
        assert_eq!(report.summary(), "non_unique_value: 2");
    }
}
