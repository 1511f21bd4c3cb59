//! Media directory listing.
//!
//! Lists the image files that may back pages of a structural record:
//! regular files directly inside one directory whose name matches a
//! pattern. Subdirectories are not descended into.

use std::io;
use std::path::Path;

use regex::Regex;

/// Default filename pattern: TIFF images, any case.
pub const DEFAULT_MEDIA_PATTERN: &str = r"(?i)\.tiff?$";

/// Basenames of matching files in `dir`, sorted.
pub fn list_media_files<P: AsRef<Path>>(dir: P, pattern: &Regex) -> io::Result<Vec<String>> {
    let mut names = Vec::new();

    for entry in std::fs::read_dir(dir.as_ref())? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if pattern.is_match(&name) {
            names.push(name);
        }
    }

    names.sort();
    Ok(names)
}

/// Compile a media pattern, falling back to [`DEFAULT_MEDIA_PATTERN`].
pub fn media_pattern(pattern: Option<&str>) -> Result<Regex, regex::Error> {
    Regex::new(pattern.unwrap_or(DEFAULT_MEDIA_PATTERN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_lists_matching_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["0002.tif", "0001.TIF", "0003.tiff", "notes.txt", "0004.jpg"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("thumbs.tif")).unwrap();

        let pattern = media_pattern(None).unwrap();
        let files = list_media_files(dir.path(), &pattern).unwrap();
        assert_eq!(files, vec!["0001.TIF", "0002.tif", "0003.tiff"]);
    }

    #[test]
    fn test_custom_pattern() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.jpg", "b.tif"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }

        let pattern = media_pattern(Some(r"\.jpg$")).unwrap();
        assert_eq!(list_media_files(dir.path(), &pattern).unwrap(), vec!["a.jpg"]);
    }

    #[test]
    fn test_missing_directory() {
        let pattern = media_pattern(None).unwrap();
        assert!(list_media_files("/definitely/not/here", &pattern).is_err());
    }
}
