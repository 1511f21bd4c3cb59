//! Domain models shared across the pipeline.
//!
//! - [`Orientation`] - whether headers run along the first row or first column
//! - [`HeaderEntry`] - one resolved header position
//! - [`FieldValue`] / [`Record`] - extracted sheet data
//! - [`Page`] / [`Side`] - one leaf of the structural page sequence
//! - [`ElementMap`] - descriptive values grouped by target XML element

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// =============================================================================
// Orientation
// =============================================================================

/// Where the header labels of a sheet live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Headers in the first row; each following row is a record.
    #[default]
    Row,
    /// Headers in the first column; each following column is a record.
    Column,
}

impl Orientation {
    /// Map a (line, position) pair to a (row, column) grid coordinate.
    ///
    /// A *line* is the header line (0) or one record; a *position* is the
    /// offset of a header within its line.
    pub fn cell(self, line: usize, position: usize) -> (usize, usize) {
        match self {
            Self::Row => (line, position),
            Self::Column => (position, line),
        }
    }
}

// =============================================================================
// Headers
// =============================================================================

/// A header position as found in the sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderEntry {
    /// Trimmed, lowercased label; `None` when the header cell is blank.
    pub label: Option<String>,
    /// Spreadsheet address of the header cell (e.g. `C1`).
    pub address: String,
    /// Offset of this header within the header line.
    pub position: usize,
}

impl HeaderEntry {
    pub fn is_blank(&self) -> bool {
        self.label.is_none()
    }
}

// =============================================================================
// Records
// =============================================================================

/// A single extracted value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Scalar(String),
    /// Pieces of a multivalued cell, in cell order.
    List(Vec<String>),
}

impl FieldValue {
    /// All values as a list; a scalar becomes a one-item list.
    pub fn to_list(&self) -> Vec<String> {
        match self {
            Self::Scalar(s) => vec![s.clone()],
            Self::List(items) => items.clone(),
        }
    }

    /// The scalar, or the first list item.
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => Some(s),
            Self::List(items) => items.first().map(String::as_str),
        }
    }

    /// Display form: list items joined with `separator`.
    pub fn join(&self, separator: &str) -> String {
        match self {
            Self::Scalar(s) => s.clone(),
            Self::List(items) => items.join(separator),
        }
    }
}

/// One record extracted from a row (or column) of the sheet.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Record {
    /// 1-based row number (row orientation) or column number (column orientation).
    pub line: usize,
    /// Values of schema-defined attributes, keyed by attribute name.
    pub attributes: IndexMap<String, FieldValue>,
    /// Values under headers that match no attribute, keyed by the header label.
    #[serde(skip_serializing_if = "IndexMap::is_empty", default)]
    pub extra: IndexMap<String, FieldValue>,
}

impl Record {
    pub fn new(line: usize) -> Self {
        Self { line, ..Self::default() }
    }

    /// Look up a value by attribute name, falling back to ad hoc headers.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.attributes.get(name).or_else(|| self.extra.get(name))
    }

    /// True when no cell of this record held a value.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.extra.is_empty()
    }
}

// =============================================================================
// Pages
// =============================================================================

/// Leaf side, derived from sequence parity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Recto,
    Verso,
}

impl Side {
    /// Odd sequences are rectos, even sequences versos.
    pub fn for_sequence(sequence: u32) -> Self {
        if sequence % 2 == 1 {
            Self::Recto
        } else {
            Self::Verso
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recto => "recto",
            Self::Verso => "verso",
        }
    }
}

/// One page of the structural sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub sequence: u32,
    /// False for images found on disk but not listed in the sheet.
    pub display: bool,
    pub side: Side,
    /// Image filename without its extension.
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible_page: Option<String>,
    #[serde(default)]
    pub toc: Vec<String>,
    #[serde(default)]
    pub illustrations: Vec<String>,
}

impl Page {
    /// A page backed by a sheet record.
    pub fn listed(sequence: u32, image: impl Into<String>) -> Self {
        Self {
            sequence,
            display: true,
            side: Side::for_sequence(sequence),
            image: image.into(),
            visible_page: None,
            toc: Vec::new(),
            illustrations: Vec::new(),
        }
    }

    /// A page for an image the sheet does not mention.
    pub fn unlisted(sequence: u32, image: impl Into<String>) -> Self {
        Self {
            display: false,
            ..Self::listed(sequence, image)
        }
    }
}

// =============================================================================
// Element Map
// =============================================================================

/// Descriptive values of one record grouped by target element name.
///
/// Elements keep first-seen order; values keep insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementMap(IndexMap<String, Vec<String>>);

impl ElementMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append values to an element, creating it on first use.
    pub fn push(&mut self, element: &str, values: impl IntoIterator<Item = String>) {
        self.0.entry(element.to_string()).or_default().extend(values);
    }

    pub fn get(&self, element: &str) -> Option<&[String]> {
        self.0.get(element).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
