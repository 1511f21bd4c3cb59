//! Sheet decoding into an addressable cell grid.
//!
//! Every sheet, whatever its source format, becomes a [`CellGrid`]: rows of
//! cells that are either absent or a trimmed, non-empty string. No
//! schema-specific logic lives here.
//!
//! Sources:
//! - CSV bytes, with encoding and delimiter auto-detection
//! - Workbooks (`.xlsx`, `.xlsm`, `.xls`, `.ods`) via `calamine`

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use crate::error::{GridError, GridResult};

// =============================================================================
// Cell Grid
// =============================================================================

/// Zero-indexed grid of optional, trimmed cell values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellGrid {
    rows: Vec<Vec<Option<String>>>,
}

impl CellGrid {
    /// Build a grid from raw rows. Values are trimmed; blank cells become `None`.
    pub fn from_rows<I, R, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        let rows = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|cell| normalize_cell(cell.as_ref().map(|c| AsRef::<str>::as_ref(c))))
                    .collect()
            })
            .collect();
        Self { rows }
    }

    /// Convenience constructor from string rows; empty strings are blank cells.
    pub fn from_strings<I, R, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_rows(rows.into_iter().map(|row| row.into_iter().map(Some)))
    }

    /// Cell value at a zero-based position, `None` when blank or out of range.
    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col)?.as_deref()
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Length of the longest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|row| row.iter().all(Option::is_none))
    }
}

fn normalize_cell(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// =============================================================================
// Addresses
// =============================================================================

/// Spreadsheet column letters for a zero-based index (0 → `A`, 26 → `AA`).
pub fn column_letters(mut col: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (col % 26) as u8);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Spreadsheet address for a zero-based (row, column) pair, e.g. (2, 1) → `B3`.
pub fn cell_address(row: usize, col: usize) -> String {
    format!("{}{}", column_letters(col), row + 1)
}

// =============================================================================
// CSV
// =============================================================================

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.into_owned()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        // UTF-8 and anything unrecognized: lossy UTF-8, BOM stripped
        _ => encoding_rs::UTF_8.decode(bytes).0.into_owned(),
    }
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> u8 {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [b',', b';', b'\t', b'|'];
    let mut best_sep = b',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep as char).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV text with an explicit delimiter. Every line, including the
/// first, becomes a grid row; header handling belongs to the extractor.
pub fn parse_csv(content: &str, delimiter: u8) -> GridResult<CellGrid> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(|field| Some(field.to_string())).collect::<Vec<_>>());
    }

    Ok(CellGrid::from_rows(rows))
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_csv_bytes(bytes: &[u8]) -> GridResult<CellGrid> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);
    parse_csv(&content, delimiter)
}

// =============================================================================
// Workbooks
// =============================================================================

/// Read one worksheet of a workbook. Uses the first sheet when `sheet` is `None`.
///
/// The used range is re-anchored at `A1`, so leading empty rows and columns
/// keep their place and addresses match what a user sees in the workbook.
pub fn read_workbook<P: AsRef<Path>>(path: P, sheet: Option<&str>) -> GridResult<CellGrid> {
    let mut workbook = open_workbook_auto(path.as_ref())
        .map_err(|e| GridError::WorkbookError(e.to_string()))?;

    let name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or(GridError::EmptySheet)?,
    };
    if !workbook.sheet_names().contains(&name) {
        return Err(GridError::SheetNotFound(name));
    }

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| GridError::WorkbookError(e.to_string()))?;

    let (row_offset, col_offset) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut rows: Vec<Vec<Option<String>>> = vec![Vec::new(); row_offset];
    for row in range.rows() {
        let mut cells: Vec<Option<String>> = vec![None; col_offset];
        cells.extend(row.iter().map(data_to_text));
        rows.push(cells);
    }

    Ok(CellGrid::from_rows(rows))
}

fn data_to_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

// =============================================================================
// Dispatch
// =============================================================================

/// Load a sheet file into a grid, choosing the decoder by extension.
pub fn load_grid<P: AsRef<Path>>(path: P, sheet: Option<&str>) -> GridResult<CellGrid> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let grid = match extension.as_str() {
        "csv" | "tsv" | "txt" => {
            let bytes = std::fs::read(path)?;
            parse_csv_bytes(&bytes)?
        }
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook(path, sheet)?,
        other => return Err(GridError::UnsupportedFormat(other.to_string())),
    };

    if grid.is_empty() {
        return Err(GridError::EmptySheet);
    }
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_trims_and_blanks() {
        let grid = CellGrid::from_strings(vec![vec![" a ", "", "  "], vec!["b"]]);

        assert_eq!(grid.get(0, 0), Some("a"));
        assert_eq!(grid.get(0, 1), None);
        assert_eq!(grid.get(0, 2), None);
        assert_eq!(grid.get(1, 0), Some("b"));
        assert_eq!(grid.get(1, 5), None);
        assert_eq!(grid.get(9, 0), None);
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.width(), 3);
    }

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
        assert_eq!(column_letters(27), "AB");
        assert_eq!(column_letters(701), "ZZ");
        assert_eq!(column_letters(702), "AAA");
    }

    #[test]
    fn test_cell_address() {
        assert_eq!(cell_address(0, 0), "A1");
        assert_eq!(cell_address(2, 1), "B3");
        assert_eq!(cell_address(9, 27), "AB10");
    }

    #[test]
    fn test_simple_csv() {
        let grid = parse_csv("name,age\nAlice,30\nBob,25", b',').unwrap();

        assert_eq!(grid.height(), 3);
        assert_eq!(grid.get(0, 0), Some("name"));
        assert_eq!(grid.get(1, 0), Some("Alice"));
        assert_eq!(grid.get(2, 1), Some("25"));
    }

    #[test]
    fn test_quoted_values_keep_delimiters() {
        let grid = parse_csv("title;subject\n\"Hours; use of Sarum\";\"A|B\"", b';').unwrap();

        assert_eq!(grid.get(1, 0), Some("Hours; use of Sarum"));
        assert_eq!(grid.get(1, 1), Some("A|B"));
    }

    #[test]
    fn test_ragged_rows() {
        let grid = parse_csv("a,b,c\n1\n1,2,3,4", b',').unwrap();

        assert_eq!(grid.get(1, 1), None);
        assert_eq!(grid.get(2, 3), Some("4"));
        assert_eq!(grid.width(), 4);
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), b';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), b',');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), b'\t');
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), b'|');
    }

    #[test]
    fn test_auto_parse() {
        let grid = parse_csv_bytes("name;age\nAlice;30\nBob;25".as_bytes()).unwrap();

        assert_eq!(grid.height(), 3);
        assert_eq!(grid.get(2, 0), Some("Bob"));
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1");
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_load_grid_from_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.csv");
        std::fs::write(&path, "filename,sequence\n0001.tif,1\n").unwrap();

        let grid = load_grid(&path, None).unwrap();
        assert_eq!(grid.get(1, 0), Some("0001.tif"));
    }

    #[test]
    fn test_load_grid_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.pdf");
        std::fs::write(&path, "x").unwrap();

        assert!(matches!(load_grid(&path, None), Err(GridError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_load_grid_rejects_empty_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        std::fs::write(&path, ",,\n").unwrap();

        assert!(matches!(load_grid(&path, None), Err(GridError::EmptySheet)));
    }
}
