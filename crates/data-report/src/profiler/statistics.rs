//! Per-column statistics.

use crate::types::ColumnSummary;
use crate::utils::{series_to_f64_zero_filled, series_to_strings};
use polars::prelude::*;
use std::collections::HashMap;

/// Numeric statistics with missing values read as zero.
pub(crate) fn numeric_summary(series: &Series) -> PolarsResult<ColumnSummary> {
    let values = series_to_f64_zero_filled(series)?;
    if values.is_empty() {
        return Ok(ColumnSummary::Numeric {
            count: 0,
            sum: 0.0,
            mean: 0.0,
            min: 0.0,
            max: 0.0,
        });
    }

    let count = values.len();
    let sum: f64 = values.iter().sum();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Ok(ColumnSummary::Numeric {
        count,
        sum,
        mean: sum / count as f64,
        min,
        max,
    })
}

/// Text statistics over the non-empty stringified values.
pub(crate) fn text_summary(series: &Series) -> PolarsResult<ColumnSummary> {
    let values: Vec<String> = series_to_strings(series)?
        .into_iter()
        .filter(|v| !v.is_empty())
        .collect();
    let counts = frequencies(&values);

    Ok(ColumnSummary::Text {
        count: values.len(),
        unique: counts.len(),
        most_common: counts
            .into_iter()
            .next()
            .map(|(value, _)| value)
            .unwrap_or_default(),
    })
}

/// Value frequencies, most frequent first. Equal counts keep the order in
/// which the values first appear.
pub(crate) fn frequencies(values: &[String]) -> Vec<(String, usize)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();

    for value in values {
        match index.get(value.as_str()) {
            Some(&pos) => counts[pos].1 += 1,
            None => {
                index.insert(value.as_str(), counts.len());
                counts.push((value.clone(), 1));
            }
        }
    }

    // stable: ties stay in first-seen order
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_numeric_summary() {
        let series = Series::new("Score".into(), &[10i64, 20, 30]);
        assert_eq!(
            numeric_summary(&series).unwrap(),
            ColumnSummary::Numeric {
                count: 3,
                sum: 60.0,
                mean: 20.0,
                min: 10.0,
                max: 30.0
            }
        );
    }

    #[test]
    fn test_numeric_summary_missing_is_zero() {
        let series = Series::new("x".into(), &[Some(4.0), None]);
        assert_eq!(
            numeric_summary(&series).unwrap(),
            ColumnSummary::Numeric {
                count: 2,
                sum: 4.0,
                mean: 2.0,
                min: 0.0,
                max: 4.0
            }
        );
    }

    #[test]
    fn test_numeric_summary_empty_column() {
        let series = Series::new_empty("x".into(), &DataType::Float64);
        let ColumnSummary::Numeric { count, mean, .. } = numeric_summary(&series).unwrap() else {
            panic!("expected numeric summary");
        };
        assert_eq!(count, 0);
        assert_eq!(mean, 0.0);
    }

    #[test]
    fn test_text_summary_all_empty() {
        let series = Series::new("Notes".into(), &[Some(""), None, Some("")]);
        assert_eq!(
            text_summary(&series).unwrap(),
            ColumnSummary::Text {
                count: 0,
                unique: 0,
                most_common: String::new()
            }
        );
    }

    #[test]
    fn test_text_summary_mode_first_seen_wins_ties() {
        let series = Series::new("City".into(), &["Oslo", "Rome", "Rome", "Oslo", "Bern"]);
        assert_eq!(
            text_summary(&series).unwrap(),
            ColumnSummary::Text {
                count: 5,
                unique: 3,
                most_common: "Oslo".to_string()
            }
        );
    }

    #[test]
    fn test_frequencies_order() {
        let values: Vec<String> = ["b", "a", "a", "c", "b", "a"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            frequencies(&values),
            vec![
                ("a".to_string(), 3),
                ("b".to_string(), 2),
                ("c".to_string(), 1)
            ]
        );
    }
}
