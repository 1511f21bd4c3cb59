//! Record extraction with header and cell validation.
//!
//! One traversal serves both orientations: a *line* is a row (row
//! orientation) or a column (column orientation), and
//! [`Orientation::cell`] maps (line, position) to grid coordinates.
//!
//! # Modes
//!
//! | Mode              | Header check | Cell checks | Records |
//! |-------------------|--------------|-------------|---------|
//! | `Full`            | yes          | yes         | yes     |
//! | `DataOnly`        | no           | no          | yes     |
//! | `ValidationOnly`  | yes          | yes         | no      |
//!
//! A failed header check ends the pass early: no records, header errors only.
//! Trailing blank lines are ignored. A blank line between records is still
//! checked, so its required values are reported, but it yields no record.
//!
//! # Example
//!
//! ```rust,ignore
//! use sheetpack::{CellGrid, Extractor, Schema};
//!
//! let mut extractor = Extractor::new(&schema, &grid);
//! let extraction = extractor.extract()?;
//! println!("{} records, {} errors", extraction.records.len(), extraction.report.len());
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ConfigResult;
use crate::logs::log_warning;
use crate::models::{FieldValue, HeaderEntry, Record};
use crate::parser::{cell_address, CellGrid};
use crate::schema::Schema;
use crate::validation::{
    data_lines, resolve_headers, split_value, validate_cell, validate_headers, ErrorReport, SeenValues,
};

/// What an extraction pass does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractMode {
    /// Validate headers and cells, and extract records.
    #[default]
    Full,
    /// Skip every check; recover whatever data the sheet holds.
    DataOnly,
    /// Run every check but keep no records.
    ValidationOnly,
}

impl ExtractMode {
    pub fn validates(self) -> bool {
        !matches!(self, Self::DataOnly)
    }

    pub fn keeps_records(self) -> bool {
        !matches!(self, Self::ValidationOnly)
    }
}

/// Result of one extraction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Extraction {
    pub headers: Vec<HeaderEntry>,
    pub records: Vec<Record>,
    pub report: ErrorReport,
    /// False when the header check failed and the pass stopped early.
    pub header_valid: bool,
}

impl Extraction {
    /// No error of any kind was collected.
    pub fn is_valid(&self) -> bool {
        self.report.is_empty()
    }
}

/// Extraction over one grid, caching its result until [`Extractor::reset`].
#[derive(Debug)]
pub struct Extractor<'a> {
    schema: &'a Schema,
    grid: &'a CellGrid,
    mode: ExtractMode,
    cached: Option<Extraction>,
}

impl<'a> Extractor<'a> {
    pub fn new(schema: &'a Schema, grid: &'a CellGrid) -> Self {
        Self::with_mode(schema, grid, ExtractMode::default())
    }

    pub fn with_mode(schema: &'a Schema, grid: &'a CellGrid, mode: ExtractMode) -> Self {
        Self {
            schema,
            grid,
            mode,
            cached: None,
        }
    }

    pub fn mode(&self) -> ExtractMode {
        self.mode
    }

    /// Change the mode; takes effect after the next [`Extractor::reset`].
    pub fn set_mode(&mut self, mode: ExtractMode) {
        self.mode = mode;
    }

    /// Run the pass, or return the cached result of a previous one.
    pub fn extract(&mut self) -> ConfigResult<&Extraction> {
        if self.cached.is_none() {
            let extraction = extract(self.schema, self.grid, self.mode)?;
            self.cached = Some(extraction);
        }
        Ok(self.cached.get_or_insert_with(Extraction::default))
    }

    /// Drop the cached result so the next [`Extractor::extract`] runs afresh.
    pub fn reset(&mut self) {
        self.cached = None;
    }

    /// Take the cached result, leaving the extractor reset.
    pub fn take(&mut self) -> Option<Extraction> {
        self.cached.take()
    }
}

/// Run one extraction pass.
///
/// Fails only on configuration errors (a data-type tag with no predicate);
/// every sheet problem is collected in the returned report.
pub fn extract(schema: &Schema, grid: &CellGrid, mode: ExtractMode) -> ConfigResult<Extraction> {
    schema.check_types()?;

    let orientation = schema.orientation();
    let headers = resolve_headers(grid, orientation);
    let mut report = ErrorReport::new();

    if mode.validates() && !validate_headers(&headers, schema, &mut report) {
        log_warning(format!("Header validation failed: {}", report.summary()));
        return Ok(Extraction {
            headers,
            records: Vec::new(),
            report,
            header_valid: false,
        });
    }

    let mut records = Vec::new();
    let mut seen = SeenValues::new();

    for line in data_lines(grid, &headers, orientation) {
        let cells: Vec<(&HeaderEntry, Option<&str>, (usize, usize))> = headers
            .iter()
            .filter(|h| !h.is_blank())
            .map(|h| {
                let (row, col) = orientation.cell(line, h.position);
                (h, grid.get(row, col), (row, col))
            })
            .collect();

        // Interior blank lines are still checked but yield no record
        let blank = cells.iter().all(|(_, cell, _)| cell.is_none());
        let keep = mode.keeps_records() && !blank;
        let mut record = Record::new(line + 1);

        for (header, cell, (row, col)) in cells {
            let Some(label) = header.label.as_deref() else {
                continue;
            };
            let definition = schema.definition_for_label(label);

            if mode.validates() {
                if let Some(def) = definition {
                    let address = cell_address(row, col);
                    if let Some(error) = validate_cell(def, cell, &address, &mut seen, schema.types())? {
                        report.push(error);
                    }
                }
            }

            if !keep {
                continue;
            }
            if let Some(text) = cell {
                let value = split_value(definition, text);
                match definition {
                    Some(def) => merge_value(&mut record.attributes, &def.name, value),
                    None => merge_value(&mut record.extra, label, value),
                }
            }
        }

        if keep {
            records.push(record);
        }
    }

    Ok(Extraction {
        headers,
        records,
        report,
        header_valid: true,
    })
}

/// Insert a value; a second value for the same key turns it into a list.
fn merge_value(map: &mut IndexMap<String, FieldValue>, key: &str, value: FieldValue) {
    match map.get_mut(key) {
        Some(existing) => {
            let mut items = existing.to_list();
            items.extend(value.to_list());
            *existing = FieldValue::List(items);
        }
        None => {
            map.insert(key.to_string(), value);
        }
    }
}
