//! High-level pipeline API: sheet file in, records or XML out.
//!
//! Each entry point combines the steps for one task:
//! decode the sheet, extract and validate, then map and serialize.
//! The `*_grid` variants skip file I/O and work on an in-memory grid.
//!
//! # Example
//!
//! ```rust,ignore
//! use sheetpack::pipeline::{package_structural, PackageOptions};
//! use sheetpack::Schema;
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let schema = Schema::load("structural.yml")?;
//!     let xml = package_structural(
//!         Path::new("pages.xlsx"),
//!         &schema,
//!         Path::new("images/"),
//!         "ark:/12345/abc",
//!         &PackageOptions::default(),
//!     )?;
//!     println!("{}", xml);
//!     Ok(())
//! }
//! ```

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PackagingError, PipelineError, PipelineResult};
use crate::logs::{log_error, log_error_indent, log_info, log_success, log_warning};
use crate::media::{list_media_files, media_pattern};
use crate::models::{HeaderEntry, Record};
use crate::parser::{load_grid, CellGrid};
use crate::schema::Schema;
use crate::validation::{data_lines, is_blank_line, ErrorReport};
use crate::xml::{descriptive_to_string, structural_to_string};

use super::descriptive::map_descriptive;
use super::extractor::{extract, ExtractMode, Extraction};
use super::structural::map_structural;

/// Options shared by the pipeline entry points.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageOptions {
    /// Extraction mode; `DataOnly` tolerates an invalid sheet.
    pub mode: ExtractMode,

    /// Worksheet name for workbooks (first sheet when unset)
    pub sheet: Option<String>,

    /// Media filename pattern (TIFF when unset)
    pub media_pattern: Option<String>,
}

/// Outcome of a validation run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSummary {
    pub sheet: String,
    pub valid: bool,
    pub header_valid: bool,
    /// Non-blank lines below the header line
    pub line_count: usize,
    pub error_count: usize,
    pub errors: ErrorReport,
    pub checked_at: DateTime<Utc>,
}

// =============================================================================
// Sheet loading
// =============================================================================

/// Decode a sheet file into a grid, logging what was read.
pub fn read_sheet(path: &Path, options: &PackageOptions) -> PipelineResult<CellGrid> {
    log_info(format!("📖 Reading sheet {}...", path.display()));
    let grid = load_grid(path, options.sheet.as_deref())?;
    log_success(format!("Read {} rows x {} columns", grid.height(), grid.width()));
    Ok(grid)
}

// =============================================================================
// Validation
// =============================================================================

/// Validate a sheet file. An invalid sheet is not an error here.
pub fn validate_sheet(path: &Path, schema: &Schema, options: &PackageOptions) -> PipelineResult<ValidationSummary> {
    let grid = read_sheet(path, options)?;
    validate_grid(&path.display().to_string(), schema, &grid)
}

/// Validate an in-memory grid.
pub fn validate_grid(name: &str, schema: &Schema, grid: &CellGrid) -> PipelineResult<ValidationSummary> {
    log_info("✔️  Validating headers and cells...");
    let extraction = extract(schema, grid, ExtractMode::ValidationOnly)?;

    let line_count = count_lines(schema, grid, &extraction.headers);
    let summary = ValidationSummary {
        sheet: name.to_string(),
        valid: extraction.is_valid(),
        header_valid: extraction.header_valid,
        line_count,
        error_count: extraction.report.len(),
        errors: extraction.report,
        checked_at: Utc::now(),
    };

    if summary.valid {
        log_success(format!("Sheet is valid ({} lines)", summary.line_count));
    } else {
        log_warning(format!("{} error(s) found", summary.error_count));
        for error in summary.errors.iter().take(5) {
            log_error_indent(error.to_string(), 1);
        }
    }
    Ok(summary)
}

fn count_lines(schema: &Schema, grid: &CellGrid, headers: &[HeaderEntry]) -> usize {
    let orientation = schema.orientation();
    data_lines(grid, headers, orientation)
        .filter(|&line| !is_blank_line(grid, headers, orientation, line))
        .count()
}

// =============================================================================
// Extraction
// =============================================================================

/// Extract records from a sheet file.
///
/// Fails with [`PipelineError::InvalidSheet`] when errors were collected,
/// unless `options.mode` is `DataOnly`.
pub fn extract_sheet(path: &Path, schema: &Schema, options: &PackageOptions) -> PipelineResult<Extraction> {
    let grid = read_sheet(path, options)?;
    extract_grid(schema, &grid, options.mode)
}

/// Extract records from an in-memory grid; same failure rule as [`extract_sheet`].
pub fn extract_grid(schema: &Schema, grid: &CellGrid, mode: ExtractMode) -> PipelineResult<Extraction> {
    log_info("🔄 Extracting records...");
    let extraction = extract(schema, grid, mode)?;

    if mode != ExtractMode::DataOnly && !extraction.report.is_empty() {
        log_error(format!("Sheet failed validation: {}", extraction.report.summary()));
        return Err(PipelineError::InvalidSheet(extraction.report));
    }

    log_success(format!("{} records extracted", extraction.records.len()));
    Ok(extraction)
}

fn records_for_packaging(schema: &Schema, grid: &CellGrid, mode: ExtractMode) -> PipelineResult<Vec<Record>> {
    // Records are required downstream
    let mode = match mode {
        ExtractMode::ValidationOnly => ExtractMode::Full,
        other => other,
    };
    Ok(extract_grid(schema, grid, mode)?.records)
}

// =============================================================================
// Structural
// =============================================================================

/// Build the structural XML for a sheet and its media directory.
pub fn package_structural(
    path: &Path,
    schema: &Schema,
    media_dir: &Path,
    identifier: &str,
    options: &PackageOptions,
) -> PipelineResult<String> {
    let grid = read_sheet(path, options)?;

    log_info(format!("📂 Listing media in {}...", media_dir.display()));
    let pattern = media_pattern(options.media_pattern.as_deref())?;
    let files = list_media_files(media_dir, &pattern).map_err(PackagingError::from)?;
    log_success(format!("{} media files", files.len()));

    structural_grid(schema, &grid, &files, identifier, options.mode)
}

/// Build structural XML from a grid and an already-listed set of media files.
pub fn structural_grid(
    schema: &Schema,
    grid: &CellGrid,
    files: &[String],
    identifier: &str,
    mode: ExtractMode,
) -> PipelineResult<String> {
    let records = records_for_packaging(schema, grid, mode)?;

    log_info("📑 Building page sequence...");
    let pages = map_structural(&records, files, schema.structural())?;
    let hidden = pages.iter().filter(|p| !p.display).count();
    if hidden > 0 {
        log_warning(format!("{} media file(s) not listed in the sheet, appended as hidden pages", hidden));
    }
    log_success(format!("{} pages", pages.len()));

    Ok(structural_to_string(identifier, &pages)?)
}

// =============================================================================
// Descriptive
// =============================================================================

/// Build the descriptive XML for a sheet.
pub fn package_descriptive(path: &Path, schema: &Schema, options: &PackageOptions) -> PipelineResult<String> {
    let grid = read_sheet(path, options)?;
    descriptive_grid(schema, &grid, options.mode)
}

/// Build descriptive XML from an in-memory grid.
pub fn descriptive_grid(schema: &Schema, grid: &CellGrid, mode: ExtractMode) -> PipelineResult<String> {
    let records = records_for_packaging(schema, grid, mode)?;

    log_info("📦 Mapping descriptive elements...");
    let maps = map_descriptive(&records, schema);
    log_success(format!("{} descriptive records", maps.len()));

    Ok(descriptive_to_string(&maps, schema.identifier_element())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logs::{LogLevel, LOG_BROADCASTER};
    use std::fs;
    use tokio::sync::broadcast::error::TryRecvError;

    const STRUCTURAL: &str = r#"
attributes:
  - name: sequence
    headings: [Sequence]
    requirement: required
    unique: true
    data_type: integer
  - name: filename
    headings: [Filename, File]
    requirement: required
    unique: true
  - name: visible_page
    headings: [Page]
  - name: toc
    headings: [TOC]
    multivalued: true
"#;

    const DESCRIPTIVE: &str = r#"
identifier: ark
attributes:
  - name: ark
    headings: [ARK]
    requirement: required
    unique: true
    data_type: ark-identifier
    element: identifier
  - name: title
    headings: [Title]
    element: title
  - name: alt_title
    headings: [Alternative Title]
    multivalued: true
    element: title
"#;

    fn structural_grid_fixture() -> CellGrid {
        CellGrid::from_strings(vec![
            vec!["Sequence", "Filename", "Page", "TOC"],
            vec!["1", "0001.tif", "1r", "Prologue|Calendar"],
            vec!["2", "0002.tif", "1v", ""],
        ])
    }

    #[test]
    fn test_validate_grid_summary() {
        let schema = Schema::from_yaml_str(STRUCTURAL).unwrap();
        let grid = CellGrid::from_strings(vec![
            vec!["Sequence", "Filename"],
            vec!["1", "0001.tif"],
            vec!["x", "0001.tif"],
        ]);

        let summary = validate_grid("pages.csv", &schema, &grid).unwrap();
        assert!(!summary.valid);
        assert!(summary.header_valid);
        assert_eq!(summary.line_count, 2);
        assert_eq!(summary.error_count, 2);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["errorCount"], 2);
        assert!(json["errors"]["non_unique_value"].is_array());
        assert!(json["checkedAt"].is_string());
    }

    #[test]
    fn test_validate_grid_counts_blank_lines() {
        let mut rx = LOG_BROADCASTER.subscribe();
        let schema = Schema::from_yaml_str(STRUCTURAL).unwrap();
        let grid = CellGrid::from_strings(vec![
            vec!["Sequence", "Filename"],
            vec!["1", "0001.tif"],
            vec!["", ""],
            vec!["2", "0002.tif"],
            vec!["", ""],
        ]);

        let summary = validate_grid("pages.csv", &schema, &grid).unwrap();
        assert_eq!(summary.line_count, 2);
        assert_eq!(summary.error_count, 2);

        // Each listed error is nested under the count
        let mut listed = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(entry) if entry.level == LogLevel::Error && entry.indent == 1 => listed.push(entry.message),
                Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        assert!(listed.iter().any(|m| m.starts_with("[required_value_missing] A3")));
        assert!(listed.iter().any(|m| m.starts_with("[required_value_missing] B3")));
    }

    #[test]
    fn test_extract_grid_failure_rule() {
        let schema = Schema::from_yaml_str(STRUCTURAL).unwrap();
        let grid = CellGrid::from_strings(vec![vec!["Sequence", "Filename"], vec!["one", "0001.tif"]]);

        let err = extract_grid(&schema, &grid, ExtractMode::Full).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidSheet(ref report) if report.len() == 1));

        let extraction = extract_grid(&schema, &grid, ExtractMode::DataOnly).unwrap();
        assert_eq!(extraction.records.len(), 1);
    }

    #[test]
    fn test_structural_grid() {
        let schema = Schema::from_yaml_str(STRUCTURAL).unwrap();
        let files: Vec<String> = ["0001.tif", "0002.tif", "0003.tif"].iter().map(|s| s.to_string()).collect();

        let xml = structural_grid(&schema, &structural_grid_fixture(), &files, "ark:/1/a", ExtractMode::Full).unwrap();
        assert!(xml.contains("<identifier>ark:/1/a</identifier>"));
        assert!(xml.contains(r#"visiblepage="1r""#));
        assert!(xml.contains(r#"<tocentry name="toc">Calendar</tocentry>"#));
        assert!(xml.contains(r#"number="3" seq="3" image.defaultscale="3" side="recto" image="0003" display="false""#));
    }

    #[test]
    fn test_structural_missing_files() {
        let schema = Schema::from_yaml_str(STRUCTURAL).unwrap();
        let files = vec!["0001.tif".to_string()];

        let err = structural_grid(&schema, &structural_grid_fixture(), &files, "ark:/1/a", ExtractMode::Full)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Packaging(PackagingError::MissingFiles(ref m)) if m == &["0002.tif"]));
    }

    #[test]
    fn test_descriptive_grid() {
        let schema = Schema::from_yaml_str(DESCRIPTIVE).unwrap();
        let grid = CellGrid::from_strings(vec![
            vec!["ARK", "Title", "Alternative Title"],
            vec!["ark:/1/a", "Hours", "Horae | Livre d'heures"],
            vec!["ark:/1/b", "Psalter", ""],
        ]);

        let xml = descriptive_grid(&schema, &grid, ExtractMode::Full).unwrap();
        assert!(xml.contains("<identifier>ark:/1/a</identifier>"));
        assert!(xml.contains("<identifier>ark:/1/b</identifier>"));
        assert!(xml.contains("<value>Horae</value>"));
        assert_eq!(xml.matches("<record>").count(), 2);
    }

    #[test]
    fn test_package_structural_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = dir.path().join("pages.csv");
        fs::write(&sheet, "Sequence;Filename;Page\n1;0001.tif;1r\n2;0002.tif;1v\n").unwrap();

        let media = dir.path().join("images");
        fs::create_dir(&media).unwrap();
        for name in ["0001.tif", "0002.tif", "0003.TIF", "readme.txt"] {
            fs::write(media.join(name), b"").unwrap();
        }

        let schema = Schema::from_yaml_str(STRUCTURAL).unwrap();
        let xml = package_structural(&sheet, &schema, &media, "ark:/1/a", &PackageOptions::default()).unwrap();
        assert_eq!(xml.matches("<page ").count(), 3);
        assert!(xml.contains(r#"image="0003""#));
    }

    #[test]
    fn test_validate_sheet_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = dir.path().join("pages.csv");
        fs::write(&sheet, "Sequence,File\n1,0001.tif\n").unwrap();

        let schema = Schema::from_yaml_str(STRUCTURAL).unwrap();
        let summary = validate_sheet(&sheet, &schema, &PackageOptions::default()).unwrap();
        assert!(summary.valid);
    }
}
