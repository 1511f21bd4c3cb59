//! Per-cell validation and value splitting.
//!
//! Checks run in a fixed order and stop at the first failure:
//! requiredness, then uniqueness, then type. Each cell yields at most
//! one error.

use std::collections::{HashMap, HashSet};

use crate::error::{ConfigError, ConfigResult};
use crate::models::FieldValue;
use crate::schema::AttributeDefinition;

use super::report::{ErrorKind, ValidationError};
use super::types::TypeRegistry;

/// Values already seen per unique attribute, scoped to one extraction pass.
#[derive(Debug, Clone, Default)]
pub struct SeenValues {
    seen: HashMap<String, HashSet<String>>,
}

impl SeenValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` under `attribute`; returns `false` if it was already there.
    pub fn insert(&mut self, attribute: &str, value: &str) -> bool {
        self.seen
            .entry(attribute.to_string())
            .or_default()
            .insert(value.to_string())
    }

    pub fn clear(&mut self) {
        self.seen.clear();
    }
}

/// Validate one cell against its definition.
///
/// `cell` is the trimmed cell text, `None` when blank. An unregistered
/// data-type tag is a configuration error, never a cell error.
pub fn validate_cell(
    definition: &AttributeDefinition,
    cell: Option<&str>,
    address: &str,
    seen: &mut SeenValues,
    types: &TypeRegistry,
) -> ConfigResult<Option<ValidationError>> {
    let value = match cell.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => value,
        None if definition.required => {
            return Ok(Some(ValidationError::new(
                ErrorKind::RequiredValueMissing,
                Some(address.to_string()),
                format!("Value for '{}' is required", definition.name),
            )));
        }
        None => return Ok(None),
    };

    if definition.unique && !seen.insert(&definition.name, value) {
        return Ok(Some(ValidationError::new(
            ErrorKind::NonUniqueValue,
            Some(address.to_string()),
            format!("Value '{}' for '{}' is not unique", value, definition.name),
        )));
    }

    let Some(tag) = definition.data_type.as_deref() else {
        return Ok(None);
    };

    let pieces = match split_value(Some(definition), value) {
        FieldValue::Scalar(s) => vec![s],
        FieldValue::List(items) => items,
    };
    for piece in &pieces {
        let valid = types.check(tag, piece).ok_or_else(|| ConfigError::UnknownDataType {
            attribute: definition.name.clone(),
            tag: tag.to_string(),
        })?;
        if !valid {
            return Ok(Some(ValidationError::new(
                ErrorKind::NonValid(tag.to_string()),
                Some(address.to_string()),
                format!("'{}' is not a valid {}", piece, tag),
            )));
        }
    }

    Ok(None)
}

/// Turn trimmed cell text into a value; multivalued text is split and each piece trimmed.
///
/// Empty pieces are dropped.
pub fn split_value(definition: Option<&AttributeDefinition>, text: &str) -> FieldValue {
    let text = text.trim();
    match definition {
        Some(def) if def.multivalued && !def.separator.is_empty() => FieldValue::List(
            text.split(def.separator.as_str())
                .map(str::trim)
                .filter(|piece| !piece.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        _ => FieldValue::Scalar(text.to_string()),
    }
}
