use crate::error::Result;
use crate::utils::is_numeric_dtype;
use polars::prelude::*;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::path::Path;
use tracing::debug;

const MAX_ROWS: usize = 1_048_576;
const MAX_COLUMNS: usize = 16_384;

/// Save a DataFrame as a single-sheet workbook with a bold header row.
///
/// Numeric columns are written as numbers, boolean columns as booleans and
/// everything else as text. Null cells are left blank.
pub fn write_workbook(df: &DataFrame, path: &Path) -> Result<()> {
    // +1 for the header row
    if df.height() + 1 > MAX_ROWS || df.width() > MAX_COLUMNS {
        return Err(XlsxError::RowColumnLimitError.into());
    }

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let header = Format::new().set_bold();

    for (col_idx, column) in df.get_columns().iter().enumerate() {
        let col = col_idx as u16;
        sheet.write_string_with_format(0, col, column.name().as_str(), &header)?;

        let series = column.as_materialized_series();
        if is_numeric_dtype(series.dtype()) {
            let values = series.cast(&DataType::Float64)?;
            for (row, value) in values.f64()?.into_iter().enumerate() {
                if let Some(v) = value.filter(|v| v.is_finite()) {
                    sheet.write_number(row as u32 + 1, col, v)?;
                }
            }
        } else if series.dtype() == &DataType::Boolean {
            for (row, value) in series.bool()?.into_iter().enumerate() {
                if let Some(v) = value {
                    sheet.write_boolean(row as u32 + 1, col, v)?;
                }
            }
        } else {
            let values = series.cast(&DataType::String)?;
            for (row, value) in values.str()?.into_iter().enumerate() {
                if let Some(v) = value {
                    sheet.write_string(row as u32 + 1, col, v)?;
                }
            }
        }
    }

    workbook.save(path)?;
    debug!("Wrote workbook {} ({} rows)", path.display(), df.height());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::read_spreadsheet;
    use tempfile::TempDir;

    #[test]
    fn test_write_then_read_keeps_shape_and_types() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.xlsx");
        let df = df! {
            "Name" => ["Al", "Bo"],
            "Score" => [10i64, 20],
            "Active" => [true, false],
        }
        .unwrap();

        write_workbook(&df, &path).unwrap();
        let back = read_spreadsheet(&path).unwrap();

        assert_eq!(back.shape(), (2, 3));
        assert_eq!(back.column("Name").unwrap().dtype(), &DataType::String);
        assert_eq!(back.column("Score").unwrap().dtype(), &DataType::Int64);
        assert_eq!(back.column("Active").unwrap().dtype(), &DataType::Boolean);
    }

    #[test]
    fn test_null_cells_are_blank() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nulls.xlsx");
        let df = df! {
            "Value" => [Some(1.5), None, Some(2.5)],
        }
        .unwrap();

        write_workbook(&df, &path).unwrap();
        let back = read_spreadsheet(&path).unwrap();

        assert_eq!(back.column("Value").unwrap().null_count(), 1);
    }
}
