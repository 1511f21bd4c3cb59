//! Error types for the sheetpack pipeline.
//!
//! Failures fall into distinct tiers, each with its own type:
//!
//! - [`GridError`] - reading a sheet into a cell grid
//! - [`ConfigError`] - schema configuration problems (fatal, processing never starts)
//! - [`PackagingError`] - sheet/disk mismatches found while building pages (fatal)
//! - [`XmlError`] - writing XML output
//! - [`PipelineError`] - top-level orchestration errors
//!
//! Header and per-cell problems are *not* errors in this sense: they are collected
//! into a [`crate::validation::ErrorReport`] and returned alongside the records.
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

use crate::validation::ErrorReport;

// =============================================================================
// Grid Errors
// =============================================================================

/// Errors while decoding a sheet into a cell grid.
#[derive(Debug, Error)]
pub enum GridError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid CSV content.
    #[error("Invalid CSV: {0}")]
    CsvError(#[from] csv::Error),

    /// Workbook could not be opened or read.
    #[error("Workbook error: {0}")]
    WorkbookError(String),

    /// Requested worksheet does not exist.
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// File extension is not a known sheet format.
    #[error("Unsupported sheet format: {0}")]
    UnsupportedFormat(String),

    /// Empty sheet.
    #[error("Sheet is empty")]
    EmptySheet,
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Schema configuration errors.
///
/// These are raised, never collected: a schema that produces one of these
/// cannot be used to validate anything.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A data-type tag has no registered predicate.
    #[error("Unknown data type '{tag}' (attribute '{attribute}')")]
    UnknownDataType { attribute: String, tag: String },

    /// An attribute descriptor has no name.
    #[error("Attribute #{index} has no name")]
    AttrNotDefined { index: usize },

    /// An attribute descriptor has no (or an empty) headings array.
    #[error("Attribute '{attribute}' has no headings array")]
    NoHeadingsArray { attribute: String },

    /// The designated identifier attribute is missing or has no target element.
    #[error("Identifier attribute '{0}' is not defined with a target element")]
    UndefinedIdentifier(String),

    /// The identifier attribute is multivalued; a record needs exactly one identifier.
    #[error("Identifier attribute '{0}' cannot be multivalued")]
    MultivaluedIdentifier(String),

    /// A target element name is not a valid XML name.
    #[error("Attribute '{attribute}' targets invalid element name '{element}'")]
    InvalidElementName { attribute: String, element: String },

    /// Two descriptors share a name.
    #[error("Attribute '{0}' is defined more than once")]
    DuplicateAttribute(String),

    /// A custom type pattern is not a valid regular expression.
    #[error("Invalid pattern for type '{tag}': {message}")]
    InvalidTypePattern { tag: String, message: String },

    /// The document does not match the configuration schema.
    #[error("Malformed schema: {}", .0.join("; "))]
    MalformedSchema(Vec<String>),

    /// Failed to read schema file.
    #[error("Failed to read schema: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON syntax error.
    #[error("Schema JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML syntax error.
    #[error("Schema YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

impl ConfigError {
    /// Report-style kind tag for this error.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownDataType { .. } => "unknown_data_type",
            Self::AttrNotDefined { .. } | Self::UndefinedIdentifier(_) => "attr_not_defined",
            Self::NoHeadingsArray { .. } => "no_headings_array",
            Self::MultivaluedIdentifier(_) => "multivalued_identifier",
            Self::DuplicateAttribute(_) => "duplicate_attribute",
            Self::InvalidElementName { .. } => "invalid_element_name",
            Self::InvalidTypePattern { .. } => "invalid_type_pattern",
            Self::MalformedSchema(_)
            | Self::IoError(_)
            | Self::JsonError(_)
            | Self::YamlError(_) => "malformed_schema",
        }
    }
}

// =============================================================================
// Packaging Errors
// =============================================================================

/// Errors while reconciling records with the files on disk.
#[derive(Debug, Error)]
pub enum PackagingError {
    /// The sheet references files that are not in the media directory.
    #[error("Files referenced in sheet but missing on disk: {}", .0.join(", "))]
    MissingFiles(Vec<String>),

    /// A record lacks a field the structural mapper needs.
    #[error("Record on line {line} has no '{field}' value")]
    MissingField { line: usize, field: String },

    /// A page sequence is not an integer.
    #[error("Record on line {line}: sequence '{value}' is not an integer")]
    InvalidSequence { line: usize, value: String },

    /// Numbering unlisted pages would run past the largest sequence number.
    #[error("Page sequence overflows after {last}")]
    SequenceOverflow { last: u32 },

    /// Failed to list the media directory.
    #[error("Failed to list media: {0}")]
    IoError(#[from] std::io::Error),
}

// =============================================================================
// XML Errors
// =============================================================================

/// Errors while writing XML.
#[derive(Debug, Error)]
pub enum XmlError {
    /// Underlying writer failed.
    #[error("XML write failed: {0}")]
    IoError(#[from] std::io::Error),

    /// Output was not valid UTF-8.
    #[error("XML output is not UTF-8: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the error type returned by the functions in
/// [`crate::transform::pipeline`]. It wraps all lower-level errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Sheet decoding error.
    #[error("Grid error: {0}")]
    Grid(#[from] GridError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Packaging error.
    #[error("Packaging error: {0}")]
    Packaging(#[from] PackagingError),

    /// XML output error.
    #[error("XML error: {0}")]
    Xml(#[from] XmlError),

    /// Invalid media filename pattern.
    #[error("Invalid media pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// The sheet failed validation.
    #[error("Sheet failed validation with {} error(s)", .0.len())]
    InvalidSheet(ErrorReport),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for grid operations.
pub type GridResult<T> = Result<T, GridError>;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for packaging operations.
pub type PackagingResult<T> = Result<T, PackagingError>;

/// Result type for XML operations.
pub type XmlResult<T> = Result<T, XmlError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
