//! Transformation module.
//!
//! This module turns a cell grid into output structures:
//! - Extractor: records and error report from a grid
//! - Structural: records + media listing into a page sequence
//! - Descriptive: records into per-record element maps
//! - Pipeline: file-level entry points combining all steps

pub mod descriptive;
pub mod extractor;
pub mod pipeline;
pub mod structural;

pub use descriptive::map_descriptive;
pub use extractor::{extract, ExtractMode, Extraction, Extractor};
pub use structural::{base_image, map_structural};
