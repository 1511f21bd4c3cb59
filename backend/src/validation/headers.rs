//! Header resolution and header validation.
//!
//! The header line is the first row (row orientation) or the first column
//! (column orientation). Both checks in [`validate_headers`] always run so
//! that every header problem is reported in one pass.

use std::ops::Range;

use indexmap::IndexMap;

use crate::models::{HeaderEntry, Orientation};
use crate::parser::{cell_address, CellGrid};
use crate::schema::Schema;

use super::report::{ErrorKind, ErrorReport};

/// Number of (lines, positions) in the grid for an orientation.
///
/// Line 0 is the header line; each further line is one record.
pub fn grid_extent(grid: &CellGrid, orientation: Orientation) -> (usize, usize) {
    match orientation {
        Orientation::Row => (grid.height(), grid.width()),
        Orientation::Column => (grid.width(), grid.height()),
    }
}

/// Record lines of the grid: from the first line after the header up to the
/// last line holding a value under a non-blank header.
///
/// Blank lines inside the range stay in it; only trailing ones are cut.
pub fn data_lines(grid: &CellGrid, headers: &[HeaderEntry], orientation: Orientation) -> Range<usize> {
    let (lines, _) = grid_extent(grid, orientation);
    let end = (1..lines)
        .rev()
        .find(|&line| !is_blank_line(grid, headers, orientation, line))
        .map_or(1, |last| last + 1);
    1..end
}

/// No cell under a non-blank header holds a value on this line.
pub fn is_blank_line(grid: &CellGrid, headers: &[HeaderEntry], orientation: Orientation, line: usize) -> bool {
    headers.iter().filter(|h| !h.is_blank()).all(|h| {
        let (row, col) = orientation.cell(line, h.position);
        grid.get(row, col).is_none()
    })
}

/// Read the header line, one entry per position, blank cells included.
pub fn resolve_headers(grid: &CellGrid, orientation: Orientation) -> Vec<HeaderEntry> {
    let (_, positions) = grid_extent(grid, orientation);

    (0..positions)
        .map(|position| {
            let (row, col) = orientation.cell(0, position);
            HeaderEntry {
                label: grid.get(row, col).map(|text| text.trim().to_lowercase()),
                address: cell_address(row, col),
                position,
            }
        })
        .collect()
}

/// Check header uniqueness and required-header presence.
///
/// Returns `true` when no header error was added.
pub fn validate_headers(headers: &[HeaderEntry], schema: &Schema, report: &mut ErrorReport) -> bool {
    let before = report.len();

    // Uniqueness: label -> every address it appears at
    let mut addresses: IndexMap<&str, Vec<&str>> = IndexMap::new();
    for header in headers {
        if let Some(label) = &header.label {
            addresses.entry(label.as_str()).or_default().push(header.address.as_str());
        }
    }
    for (label, found) in addresses.iter().filter(|(_, found)| found.len() > 1) {
        report.add(
            ErrorKind::NonUniqueHeader,
            Some(found.join(", ")),
            format!("Header '{}' appears {} times", label, found.len()),
        );
    }

    // Presence of every required heading
    for definition in schema.attributes().iter().filter(|d| d.needs_heading()) {
        let present = definition.headings.iter().any(|h| addresses.contains_key(h.as_str()));
        if !present {
            report.add(
                ErrorKind::RequiredHeaderMissing,
                None,
                format!(
                    "Required header for '{}' is missing (expected one of: {})",
                    definition.name,
                    definition.headings.join(", ")
                ),
            );
        }
    }

    report.len() == before
}
