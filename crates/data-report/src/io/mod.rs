//! File input and output.
//!
//! - [`load_file`] reads one CSV or spreadsheet file into a DataFrame,
//!   choosing the parser from the file extension (case-insensitive).
//! - [`write_workbook`] saves a DataFrame as a single-sheet `.xlsx` workbook.

mod spreadsheet;
mod workbook;

pub use spreadsheet::read_spreadsheet;
pub use workbook::write_workbook;

use crate::error::{ReportError, Result};
use crate::utils::extension_lowercase;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::path::Path;
use tracing::debug;

/// Load a CSV or spreadsheet file.
///
/// `.csv` files use the delimited-text reader; every other extension is
/// handed to the spreadsheet reader, which rejects formats it does not know.
///
/// # Errors
///
/// Returns [`ReportError::Load`] if the file does not exist or cannot be parsed.
pub fn load_file(path: &Path) -> Result<DataFrame> {
    let load_error = |reason: String| ReportError::Load {
        path: path.display().to_string(),
        reason,
    };

    if !path.is_file() {
        return Err(load_error("file does not exist".to_string()));
    }

    let df = match extension_lowercase(path).as_str() {
        "csv" => read_csv(path).map_err(|e| load_error(e.to_string()))?,
        _ => read_spreadsheet(path).map_err(|e| load_error(format!("{e:#}")))?,
    };

    debug!(
        "Loaded {}: {} rows x {} columns",
        path.display(),
        df.height(),
        df.width()
    );
    Ok(df)
}

/// Column types are inferred from every row, so a late value that does not
/// fit the early rows widens the column instead of failing the file.
fn read_csv(path: &Path) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_infer_schema_length(None)
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
}
