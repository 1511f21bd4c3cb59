//! Structural mapping: records and on-disk images into a page sequence.
//!
//! Sheet-backed pages come first, in record order and with their declared
//! sequence numbers; they are never renumbered or re-sorted. Images on disk
//! that no record mentions follow, in listing order, numbered on from the
//! highest declared sequence and hidden (`display = false`).

use std::collections::HashSet;

use crate::error::{PackagingError, PackagingResult};
use crate::models::{FieldValue, Page, Record};
use crate::schema::StructuralFields;

/// Build the page sequence.
///
/// # Errors
///
/// - [`PackagingError::MissingField`] when a record has no filename or sequence
/// - [`PackagingError::MissingFiles`] when the sheet names files absent from `files`
/// - [`PackagingError::InvalidSequence`] when a sequence is not an integer
/// - [`PackagingError::SequenceOverflow`] when unlisted pages cannot be numbered
///
/// File checks run before any page is built.
pub fn map_structural(
    records: &[Record],
    files: &[String],
    fields: &StructuralFields,
) -> PackagingResult<Vec<Page>> {
    let on_disk: HashSet<&str> = files.iter().map(String::as_str).collect();

    // Pre-check: every referenced file must exist
    let mut referenced = HashSet::new();
    let mut missing = Vec::new();
    for record in records {
        let filename = required_text(record, &fields.filename)?;
        if !on_disk.contains(filename) && !missing.iter().any(|m| m == filename) {
            missing.push(filename.to_string());
        }
        referenced.insert(filename);
    }
    if !missing.is_empty() {
        return Err(PackagingError::MissingFiles(missing));
    }

    let mut pages = Vec::with_capacity(files.len().max(records.len()));
    let mut max_sequence = 0;

    for record in records {
        let filename = required_text(record, &fields.filename)?;
        let raw_sequence = required_text(record, &fields.sequence)?;
        let sequence: u32 = raw_sequence
            .trim()
            .parse()
            .map_err(|_| PackagingError::InvalidSequence {
                line: record.line,
                value: raw_sequence.to_string(),
            })?;
        max_sequence = max_sequence.max(sequence);

        let mut page = Page::listed(sequence, base_image(filename));
        page.visible_page = record
            .get(&fields.visible_page)
            .and_then(FieldValue::first)
            .map(str::to_string);
        page.toc = list_of(record, &fields.toc);
        page.illustrations = list_of(record, &fields.illustrations);
        pages.push(page);
    }

    let mut last = max_sequence;
    for file in files.iter().filter(|f| !referenced.contains(f.as_str())) {
        let next = last
            .checked_add(1)
            .ok_or(PackagingError::SequenceOverflow { last })?;
        pages.push(Page::unlisted(next, base_image(file)));
        last = next;
    }

    Ok(pages)
}

/// Filename without its last extension (`0001.tif` → `0001`).
pub fn base_image(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(i) if i > 0 => &filename[..i],
        _ => filename,
    }
}

fn required_text<'r>(record: &'r Record, field: &str) -> PackagingResult<&'r str> {
    record
        .get(field)
        .and_then(FieldValue::first)
        .ok_or_else(|| PackagingError::MissingField {
            line: record.line,
            field: field.to_string(),
        })
}

fn list_of(record: &Record, field: &str) -> Vec<String> {
    record.get(field).map(FieldValue::to_list).unwrap_or_default()
}
