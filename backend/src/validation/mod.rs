//! Sheet validation.
//!
//! - [`types`] - data-type predicates keyed by tag
//! - [`headers`] - header resolution, uniqueness and presence checks
//! - [`cells`] - per-cell checks and multivalued splitting
//! - [`report`] - errors collected by kind
//!
//! Plus [`validate`], a JSON Schema (Draft 7) check used on configuration
//! documents before they are compiled.
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use sheetpack::validation::validate;
//!
//! let schema = json!({
//!     "type": "object",
//!     "required": ["attributes"]
//! });
//!
//! assert!(validate(&schema, &json!({ "attributes": [] })).is_ok());
//! assert!(validate(&schema, &json!({ "orientation": "row" })).is_err());
//! ```

pub mod cells;
pub mod headers;
pub mod report;
pub mod types;

use serde_json::Value;

pub use cells::{split_value, validate_cell, SeenValues};
pub use headers::{data_lines, grid_extent, is_blank_line, resolve_headers, validate_headers};
pub use report::{ErrorKind, ErrorReport, ValidationError};
pub use types::{Predicate, TypeRegistry, ARK_IDENTIFIER, INTEGER};

/// Validate a JSON value against a JSON Schema.
///
/// Returns every violation message when invalid.
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema)
        .map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
