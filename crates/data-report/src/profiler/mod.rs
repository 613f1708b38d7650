//! Column summaries for the cleaned table.
//!
//! Each column is summarized independently; a column whose statistics cannot
//! be computed gets an `unknown` record carrying the error instead of failing
//! the whole summary.

mod statistics;

pub(crate) use statistics::frequencies;

use crate::types::{ColumnKind, ColumnSummary, NamedSummary};
use polars::prelude::*;
use tracing::{debug, warn};

/// Summarize every column of `df` in column order.
pub fn summarize(df: &DataFrame) -> Vec<NamedSummary> {
    df.get_columns()
        .iter()
        .map(|column| {
            let series = column.as_materialized_series();
            let summary = summarize_series(series).unwrap_or_else(|e| {
                warn!("Could not summarize column '{}': {}", series.name(), e);
                ColumnSummary::Unknown {
                    error: e.to_string(),
                }
            });
            debug!("Summarized '{}' as {}", series.name(), summary.type_name());

            NamedSummary {
                column: series.name().to_string(),
                summary,
            }
        })
        .collect()
}

/// Numeric columns get numeric statistics; every other column is treated as text.
pub fn summarize_series(series: &Series) -> PolarsResult<ColumnSummary> {
    match ColumnKind::classify(series.dtype()) {
        ColumnKind::Numeric => statistics::numeric_summary(series),
        ColumnKind::Text | ColumnKind::Unknown => statistics::text_summary(series),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_summarize_keeps_column_order() {
        let df = df! {
            "Name" => ["Al", "Bo", "Al"],
            "Score" => [10i64, 20, 30],
        }
        .unwrap();

        let summaries = summarize(&df);
        let columns: Vec<&str> = summaries.iter().map(|s| s.column.as_str()).collect();

        assert_eq!(columns, vec!["Name", "Score"]);
        assert_eq!(summaries[0].summary.type_name(), "text");
        assert_eq!(summaries[1].summary.type_name(), "numeric");
    }

    #[test]
    fn test_summarize_boolean_as_text() {
        let df = df! { "Flag" => [true, true, false] }.unwrap();
        assert_eq!(
            summarize(&df)[0].summary,
            ColumnSummary::Text {
                count: 3,
                unique: 2,
                most_common: "true".to_string()
            }
        );
    }

    #[test]
    fn test_summarize_empty_table() {
        assert!(summarize(&DataFrame::empty()).is_empty());
    }
}
