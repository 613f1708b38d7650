//! Merge several input files into one table with row provenance.

use crate::error::{ReportError, Result};
use crate::io::load_file;
use crate::types::{SOURCE_FILE_COLUMN, SkippedFile};
use crate::utils::{file_base_name, is_integer_dtype, is_numeric_dtype};
use polars::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Result of merging a set of input files.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// All readable rows, each tagged with its `Source_File`.
    pub table: DataFrame,
    /// Base names of the files that loaded, in input order.
    pub read_files: Vec<String>,
    /// Files that failed to load, with the reason.
    pub skipped: Vec<SkippedFile>,
}

/// Load every file, tag its rows with the file's base name and concatenate
/// the results by column name.
///
/// A file that fails to load is logged and skipped. `progress` receives the
/// percentage of files attempted so far and a status line after each file.
///
/// # Errors
///
/// Returns [`ReportError::NoReadableData`] when no file could be read or the
/// readable files hold no rows.
pub fn merge_files<P: AsRef<Path>>(
    paths: &[P],
    progress: &mut dyn FnMut(u8, &str),
) -> Result<MergeOutcome> {
    let total = paths.len();
    let mut frames = Vec::with_capacity(total);
    let mut read_files = Vec::new();
    let mut skipped = Vec::new();

    for (idx, path) in paths.iter().enumerate() {
        let path = path.as_ref();
        let name = file_base_name(path);

        match load_file(path).and_then(|df| tag_source(df, &name)) {
            Ok(df) => {
                debug!("Read {} ({} rows)", name, df.height());
                frames.push(df);
                read_files.push(name);
            }
            Err(e) => {
                warn!("Skipping {}: {}", name, e);
                skipped.push(SkippedFile {
                    name,
                    reason: e.to_string(),
                });
            }
        }

        let done = idx + 1;
        progress(
            (done * 100 / total) as u8,
            &format!("Loaded {done}/{total} files"),
        );
    }

    if frames.is_empty() {
        return Err(ReportError::NoReadableData);
    }

    let table = concat_by_name(frames)?;
    if table.height() == 0 {
        warn!("Every readable file was empty");
        return Err(ReportError::NoReadableData);
    }
    Ok(MergeOutcome {
        table,
        read_files,
        skipped,
    })
}

/// Add (or overwrite) the provenance column.
fn tag_source(mut df: DataFrame, name: &str) -> Result<DataFrame> {
    let values = vec![name.to_string(); df.height()];
    df.with_column(Column::new(SOURCE_FILE_COLUMN.into(), values))?;
    Ok(df)
}

/// Dtype a column contributes to the merge: `Null` when it holds no values.
fn observed_dtype(column: &Column) -> DataType {
    if column.null_count() == column.len() {
        DataType::Null
    } else {
        column.dtype().clone()
    }
}

/// Common dtype for a column seen with two different dtypes.
fn unify_dtype(a: &DataType, b: &DataType) -> DataType {
    if a == b || b == &DataType::Null {
        a.clone()
    } else if a == &DataType::Null {
        b.clone()
    } else if is_integer_dtype(a) && is_integer_dtype(b) {
        DataType::Int64
    } else if is_numeric_dtype(a) && is_numeric_dtype(b) {
        DataType::Float64
    } else {
        DataType::String
    }
}

/// Vertically concatenate frames over the union of their columns.
///
/// Columns keep first-seen order; a column missing from a frame is null for
/// that frame's rows. A column with no values in some frame does not take part
/// in picking the merged dtype. If it has no values anywhere it keeps the
/// dtype it was first read with.
fn concat_by_name(frames: Vec<DataFrame>) -> Result<DataFrame> {
    let mut order: Vec<PlSmallStr> = Vec::new();
    let mut declared: HashMap<PlSmallStr, DataType> = HashMap::new();
    let mut dtypes: HashMap<PlSmallStr, DataType> = HashMap::new();

    for df in &frames {
        for column in df.get_columns() {
            let observed = observed_dtype(column);
            match dtypes.get_mut(column.name()) {
                Some(existing) => *existing = unify_dtype(existing, &observed),
                None => {
                    order.push(column.name().clone());
                    declared.insert(column.name().clone(), column.dtype().clone());
                    dtypes.insert(column.name().clone(), observed);
                }
            }
        }
    }

    for (name, dtype) in dtypes.iter_mut() {
        if *dtype == DataType::Null {
            if let Some(first) = declared.get(name) {
                *dtype = first.clone();
            }
        }
    }

    let mut merged: Option<DataFrame> = None;
    for df in frames {
        let height = df.height();
        let columns = order
            .iter()
            .map(|name| {
                let target = &dtypes[name];
                match df.column(name.as_str()) {
                    Ok(column) => column.cast(target),
                    Err(_) => Ok(Column::full_null(name.clone(), height, target)),
                }
            })
            .collect::<PolarsResult<Vec<_>>>()?;
        let aligned = DataFrame::new(columns)?;

        match merged.as_mut() {
            Some(acc) => {
                acc.vstack_mut(&aligned)?;
            }
            None => merged = Some(aligned),
        }
    }

    merged.ok_or(ReportError::NoReadableData)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_merge_tags_provenance() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.csv", "Name,Score\nAl,10\nBo,20\n");
        let b = write(&dir, "b.csv", "Name,Score\nAl,10\nCy,30\n");

        let outcome = merge_files(&[a, b], &mut |_, _| {}).unwrap();

        assert_eq!(outcome.table.shape(), (4, 3));
        assert_eq!(outcome.read_files, vec!["a.csv", "b.csv"]);
        let sources: Vec<_> = outcome
            .table
            .column(SOURCE_FILE_COLUMN)
            .unwrap()
            .str()
            .unwrap()
            .into_no_null_iter()
            .map(str::to_string)
            .collect();
        assert_eq!(sources, vec!["a.csv", "a.csv", "b.csv", "b.csv"]);
    }

    #[test]
    fn test_merge_column_union_fills_nulls() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.csv", "Name,Score\nAl,10\n");
        let b = write(&dir, "b.csv", "Name,City\nBo,Oslo\n");

        let outcome = merge_files(&[a, b], &mut |_, _| {}).unwrap();
        let names: Vec<&str> = outcome
            .table
            .get_column_names()
            .into_iter()
            .map(|n| n.as_str())
            .collect();

        assert_eq!(names, vec!["Name", "Score", SOURCE_FILE_COLUMN, "City"]);
        assert_eq!(outcome.table.column("Score").unwrap().null_count(), 1);
        assert_eq!(outcome.table.column("City").unwrap().null_count(), 1);
    }

    #[test]
    fn test_merge_mixed_numeric_dtypes_widen() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.csv", "Score\n10\n");
        let b = write(&dir, "b.csv", "Score\n2.5\n");

        let outcome = merge_files(&[a, b], &mut |_, _| {}).unwrap();
        assert_eq!(
            outcome.table.column("Score").unwrap().dtype(),
            &DataType::Float64
        );
    }

    #[test]
    fn test_merge_empty_column_keeps_numeric_dtype() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.csv", "Name,Score\nAl,10\nBo,20\n");
        let b = write(&dir, "b.csv", "Name,Score\nCy,\n");

        let outcome = merge_files(&[a, b], &mut |_, _| {}).unwrap();
        let score = outcome.table.column("Score").unwrap();

        assert_eq!(score.dtype(), &DataType::Int64);
        assert_eq!(score.null_count(), 1);
    }

    #[test]
    fn test_merge_column_empty_everywhere_keeps_read_dtype() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.csv", "Name,Notes\nAl,\n");
        let b = write(&dir, "b.csv", "Name,Notes\nBo,\n");

        let outcome = merge_files(&[a, b], &mut |_, _| {}).unwrap();
        assert_eq!(
            outcome.table.column("Notes").unwrap().dtype(),
            &DataType::String
        );
    }

    #[test]
    fn test_merge_header_only_files_is_no_readable_data() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.csv", "Name,Score\n");
        let b = write(&dir, "b.csv", "Name,Score\n");

        let err = merge_files(&[a, b], &mut |_, _| {}).unwrap_err();
        assert!(matches!(err, ReportError::NoReadableData));
    }

    #[test]
    fn test_merge_skips_unreadable_files() {
        let dir = TempDir::new().unwrap();
        let good = write(&dir, "good.csv", "x\n1\n");
        let bad = write(&dir, "bad.xlsx", "definitely not a workbook");

        let outcome = merge_files(&[bad, good], &mut |_, _| {}).unwrap();

        assert_eq!(outcome.read_files, vec!["good.csv"]);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].name, "bad.xlsx");
    }

    #[test]
    fn test_merge_nothing_readable() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.csv");

        let err = merge_files(&[missing], &mut |_, _| {}).unwrap_err();
        assert!(matches!(err, ReportError::NoReadableData));
    }

    #[test]
    fn test_merge_progress_messages() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.csv", "x\n1\n");
        let b = write(&dir, "b.csv", "x\n2\n");

        let mut events = Vec::new();
        merge_files(&[a, b], &mut |pct, msg| events.push((pct, msg.to_string()))).unwrap();

        assert_eq!(
            events,
            vec![
                (50, "Loaded 1/2 files".to_string()),
                (100, "Loaded 2/2 files".to_string())
            ]
        );
    }

    #[test]
    fn test_unify_dtype() {
        assert_eq!(unify_dtype(&DataType::Int64, &DataType::Int32), DataType::Int64);
        assert_eq!(
            unify_dtype(&DataType::Int64, &DataType::Float64),
            DataType::Float64
        );
        assert_eq!(
            unify_dtype(&DataType::Int64, &DataType::String),
            DataType::String
        );
        assert_eq!(unify_dtype(&DataType::Null, &DataType::Boolean), DataType::Boolean);
    }
}
