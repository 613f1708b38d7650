//! Column-wise cleaning and duplicate removal.
//!
//! Every column is classified once with [`ColumnKind::classify`] and cleaned
//! according to its kind:
//! - text: trim surrounding whitespace, missing becomes `""`
//! - numeric: missing (and NaN) becomes `0`
//! - anything else: if it has missing values, it is stringified with
//!   missing becoming `""`
//!
//! A column whose kind-specific cleaning fails falls back to the text rules
//! and is reported as a [`ColumnDiagnostic`] instead of failing the run.

use crate::error::{ReportError, Result};
use crate::types::{ColumnDiagnostic, ColumnKind, SOURCE_FILE_COLUMN};
use crate::utils::{is_integer_dtype, series_to_f64_zero_filled, series_to_strings};
use polars::prelude::*;
use tracing::{debug, info, warn};

/// Cleaned table plus the per-column failures that were recovered.
#[derive(Debug, Clone)]
pub struct CleanOutcome {
    pub table: DataFrame,
    pub diagnostics: Vec<ColumnDiagnostic>,
}

/// Clean every column of `df` in column order.
///
/// The `Source_File` column is left as is. `progress` receives the
/// percentage of columns processed and a status line after each column.
pub fn clean_table(mut df: DataFrame, progress: &mut dyn FnMut(u8, &str)) -> Result<CleanOutcome> {
    let names: Vec<PlSmallStr> = df.get_column_names_owned();
    let total = names.len();
    let mut diagnostics = Vec::new();

    info!("Cleaning {} columns", total);

    for (idx, name) in names.iter().enumerate() {
        if name.as_str() != SOURCE_FILE_COLUMN {
            let series = df.column(name.as_str())?.as_materialized_series().clone();
            let kind = ColumnKind::classify(series.dtype());

            let cleaned = match clean_column(&series, kind) {
                Ok(cleaned) => cleaned,
                Err(e) => {
                    let err = ReportError::ColumnProcessing {
                        column: name.to_string(),
                        reason: e.to_string(),
                    };
                    warn!("{}; treating it as text", err);
                    diagnostics.push(ColumnDiagnostic {
                        column: name.to_string(),
                        message: format!("cleaned as text after error: {e}"),
                    });
                    Some(clean_text(&series)?)
                }
            };

            if let Some(cleaned) = cleaned {
                df.with_column(cleaned)?;
            }
            debug!("Cleaned column '{}' as {:?}", name, kind);
        }

        let done = idx + 1;
        progress(
            (done * 100 / total) as u8,
            &format!("Cleaning columns: {done}/{total}"),
        );
    }

    Ok(CleanOutcome {
        table: df,
        diagnostics,
    })
}

/// Cleaned replacement for one column, or `None` when it needs no change.
fn clean_column(series: &Series, kind: ColumnKind) -> PolarsResult<Option<Series>> {
    match kind {
        ColumnKind::Text => clean_text(series).map(Some),
        ColumnKind::Numeric => clean_numeric(series).map(Some),
        ColumnKind::Unknown if series.null_count() > 0 => {
            let values = series_to_strings(series)?;
            Ok(Some(Series::new(series.name().clone(), values)))
        }
        ColumnKind::Unknown => Ok(None),
    }
}

fn clean_text(series: &Series) -> PolarsResult<Series> {
    let values: Vec<String> = series_to_strings(series)?
        .into_iter()
        .map(|v| v.trim().to_string())
        .collect();
    Ok(Series::new(series.name().clone(), values))
}

/// Integers stay integral; everything else becomes Float64.
fn clean_numeric(series: &Series) -> PolarsResult<Series> {
    if is_integer_dtype(series.dtype()) {
        let as_i64 = series.cast(&DataType::Int64)?;
        let values: Vec<i64> = as_i64.i64()?.into_iter().map(|v| v.unwrap_or(0)).collect();
        Ok(Series::new(series.name().clone(), values))
    } else {
        let values = series_to_f64_zero_filled(series)?;
        Ok(Series::new(series.name().clone(), values))
    }
}

/// Drop rows whose data columns match an earlier row, keeping the first
/// occurrence and the order of the kept rows.
///
/// `Source_File` is not part of the comparison, so the same record read from
/// two files counts once and keeps the tag of the file it was first seen in.
///
/// Returns the deduplicated table and the number of rows removed.
pub fn remove_duplicates(df: DataFrame) -> Result<(DataFrame, usize)> {
    let before = df.height();
    let keys: Vec<PlSmallStr> = df
        .get_column_names_owned()
        .into_iter()
        .filter(|name| name.as_str() != SOURCE_FILE_COLUMN)
        .collect();
    let subset = (!keys.is_empty()).then(|| cols(keys));

    let deduped = df
        .lazy()
        .unique_stable(subset, UniqueKeepStrategy::First)
        .collect()?;
    let removed = before - deduped.height();

    debug!("Removed {} duplicate rows", removed);
    Ok((deduped, removed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn strings(df: &DataFrame, name: &str) -> Vec<String> {
        df.column(name)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap_or("<null>").to_string())
            .collect()
    }

    #[test]
    fn test_clean_text_trims_and_fills() {
        let df = df! {
            "Name" => [Some("  Al "), None, Some("Bo")],
        }
        .unwrap();

        let outcome = clean_table(df, &mut |_, _| {}).unwrap();
        assert_eq!(strings(&outcome.table, "Name"), vec!["Al", "", "Bo"]);
        assert!(outcome.diagnostics.is_empty());
    }

    #[test]
    fn test_clean_numeric_fills_zero() {
        let df = df! {
            "Score" => [Some(10i64), None, Some(30)],
            "Ratio" => [Some(0.5), Some(f64::NAN), None],
        }
        .unwrap();

        let outcome = clean_table(df, &mut |_, _| {}).unwrap();
        let score: Vec<i64> = outcome
            .table
            .column("Score")
            .unwrap()
            .i64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        let ratio: Vec<f64> = outcome
            .table
            .column("Ratio")
            .unwrap()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect();

        assert_eq!(score, vec![10, 0, 30]);
        assert_eq!(ratio, vec![0.5, 0.0, 0.0]);
    }

    #[test]
    fn test_clean_unknown_with_nulls_is_stringified() {
        let df = df! {
            "Flag" => [Some(true), None],
            "Solid" => [true, false],
        }
        .unwrap();

        let outcome = clean_table(df, &mut |_, _| {}).unwrap();
        assert_eq!(strings(&outcome.table, "Flag"), vec!["true", ""]);
        assert_eq!(
            outcome.table.column("Solid").unwrap().dtype(),
            &DataType::Boolean
        );
    }

    #[test]
    fn test_source_file_untouched() {
        let df = df! {
            SOURCE_FILE_COLUMN => [" a.csv ", "b.csv"],
        }
        .unwrap();

        let outcome = clean_table(df, &mut |_, _| {}).unwrap();
        assert_eq!(strings(&outcome.table, SOURCE_FILE_COLUMN), vec![" a.csv ", "b.csv"]);
    }

    #[test]
    fn test_clean_is_idempotent() {
        let df = df! {
            "Name" => [Some(" Al"), None, Some("Bo ")],
            "Score" => [Some(1.5), None, Some(2.0)],
            "Flag" => [Some(false), None, Some(true)],
        }
        .unwrap();

        let once = clean_table(df, &mut |_, _| {}).unwrap().table;
        let twice = clean_table(once.clone(), &mut |_, _| {}).unwrap().table;
        assert!(once.equals_missing(&twice));
    }

    #[test]
    fn test_clean_progress() {
        let df = df! {
            "a" => [1i64],
            "b" => ["x"],
        }
        .unwrap();

        let mut events = Vec::new();
        clean_table(df, &mut |pct, msg| events.push((pct, msg.to_string()))).unwrap();

        assert_eq!(
            events,
            vec![
                (50, "Cleaning columns: 1/2".to_string()),
                (100, "Cleaning columns: 2/2".to_string())
            ]
        );
    }

    #[test]
    fn test_remove_duplicates_keeps_first_in_order() {
        let df = df! {
            "Name" => ["Al", "Bo", "Al", "Cy"],
            "Score" => [10i64, 20, 10, 30],
        }
        .unwrap();

        let (deduped, removed) = remove_duplicates(df).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(strings(&deduped, "Name"), vec!["Al", "Bo", "Cy"]);
    }

    #[test]
    fn test_remove_duplicates_ignores_source_tag() {
        let df = df! {
            "Name" => ["Al", "Bo", "Al", "Cy"],
            "Score" => [10i64, 20, 10, 30],
            SOURCE_FILE_COLUMN => ["a.csv", "a.csv", "b.csv", "b.csv"],
        }
        .unwrap();

        let (deduped, removed) = remove_duplicates(df).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(strings(&deduped, "Name"), vec!["Al", "Bo", "Cy"]);
        assert_eq!(
            strings(&deduped, SOURCE_FILE_COLUMN),
            vec!["a.csv", "a.csv", "b.csv"]
        );
    }

    #[test]
    fn test_remove_duplicates_no_duplicates() {
        let df = df! { "x" => [1i64, 2, 3] }.unwrap();
        let (deduped, removed) = remove_duplicates(df).unwrap();
        assert_eq!(removed, 0);
        assert_eq!(deduped.height(), 3);
    }
}
