//! # Sheetpack - schema-driven spreadsheet validation and XML packaging
//!
//! Sheetpack reads a spreadsheet, checks it against a declarative attribute
//! schema, and maps the resulting records into structural (page sequence)
//! or descriptive XML for digital-library packages.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Sheet File  │────▶│   Parser    │────▶│  Extractor  │────▶│   Mappers   │────▶ XML
//! │ (CSV/XLSX)  │     │ (cell grid) │     │ (+ schema)  │     │ (+ media)   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sheetpack::{extract, CellGrid, ExtractMode, Schema};
//!
//! let schema = Schema::load("descriptive.yml")?;
//! let grid = sheetpack::load_grid("items.xlsx", None)?;
//! let extraction = extract(&schema, &grid, ExtractMode::Full)?;
//! println!("{} records, {} errors", extraction.records.len(), extraction.report.len());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`logs`] - Broadcast logging
//! - [`models`] - Domain models (Record, Page, ElementMap)
//! - [`parser`] - Sheet decoding into a cell grid
//! - [`schema`] - Attribute schema compilation
//! - [`validation`] - Type registry, header and cell checks, error report
//! - [`transform`] - Extraction, structural and descriptive mapping, pipeline
//! - [`media`] - Media directory listing
//! - [`xml`] - XML output

// Core modules
pub mod error;
pub mod logs;
pub mod models;

// Parsing
pub mod parser;

// Configuration
pub mod schema;

// Validation
pub mod validation;

// Transformation
pub mod transform;

// Output
pub mod media;
pub mod xml;

pub use transform::pipeline;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, ConfigResult, GridError, GridResult, PackagingError, PackagingResult, PipelineError,
    PipelineResult, XmlError, XmlResult,
};

// =============================================================================
// Re-exports - Logging
// =============================================================================

pub use logs::{
    log_error, log_error_indent, log_info, log_success, log_warning, LogEntry, LogLevel, LOG_BROADCASTER,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{ElementMap, FieldValue, HeaderEntry, Orientation, Page, Record, Side};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{cell_address, column_letters, load_grid, parse_csv, parse_csv_bytes, read_workbook, CellGrid};

// =============================================================================
// Re-exports - Schema
// =============================================================================

pub use schema::{AttributeDefinition, RawAttribute, RawSchema, Schema, StructuralFields};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{
    resolve_headers, validate_cell, validate_headers, ErrorKind, ErrorReport, SeenValues, TypeRegistry,
    ValidationError,
};

// =============================================================================
// Re-exports - Transformation
// =============================================================================

pub use transform::{extract, map_descriptive, map_structural, ExtractMode, Extraction, Extractor};

pub use transform::pipeline::{
    descriptive_grid, extract_grid, extract_sheet, package_descriptive, package_structural, structural_grid,
    validate_grid, validate_sheet, PackageOptions, ValidationSummary,
};

// =============================================================================
// Re-exports - Media & XML
// =============================================================================

pub use media::{list_media_files, DEFAULT_MEDIA_PATTERN};

pub use xml::{descriptive_to_string, structural_to_string, write_descriptive, write_structural};
