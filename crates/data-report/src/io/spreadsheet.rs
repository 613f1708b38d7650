//! Spreadsheet reader built on calamine.

use anyhow::{Context as _, Result, anyhow};
use calamine::{Data, Reader, open_workbook_auto};
use polars::prelude::*;
use std::collections::HashSet;
use std::path::Path;

/// Read the first worksheet of a workbook. The first row is the header.
pub fn read_spreadsheet(path: &Path) -> Result<DataFrame> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Unsupported or unreadable spreadsheet: {}", path.display()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("Workbook has no worksheets"))?
        .context("Failed to read first worksheet")?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(DataFrame::empty());
    };
    let body: Vec<&[Data]> = rows.collect();

    let names = header_names(header_row);
    let mut columns = Vec::with_capacity(names.len());
    for (idx, name) in names.iter().enumerate() {
        let cells: Vec<&Data> = body
            .iter()
            .map(|row| row.get(idx).unwrap_or(&Data::Empty))
            .collect();
        columns.push(build_column(name, &cells));
    }

    DataFrame::new(columns).context("Failed to assemble worksheet columns")
}

/// Header cells as unique column names; blanks become `column_<n>`.
fn header_names(header_row: &[Data]) -> Vec<String> {
    let mut seen = HashSet::new();
    header_row
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let raw = match cell {
                Data::Empty => String::new(),
                other => other.to_string().trim().to_string(),
            };
            let base = if raw.is_empty() {
                format!("column_{}", idx + 1)
            } else {
                raw
            };

            let mut name = base.clone();
            let mut suffix = 1;
            while !seen.insert(name.clone()) {
                suffix += 1;
                name = format!("{base}_{suffix}");
            }
            name
        })
        .collect()
}

/// Pick the narrowest column type that holds every non-empty cell.
fn build_column(name: &str, cells: &[&Data]) -> Column {
    let non_empty: Vec<&&Data> = cells
        .iter()
        .filter(|c| !matches!(c, Data::Empty))
        .collect();

    let all_numeric = !non_empty.is_empty()
        && non_empty
            .iter()
            .all(|c| matches!(c, Data::Int(_) | Data::Float(_)));
    let all_bool = !non_empty.is_empty() && non_empty.iter().all(|c| matches!(c, Data::Bool(_)));

    let series = if all_numeric {
        let all_integral = non_empty.iter().all(|c| match c {
            Data::Float(f) => f.fract() == 0.0 && f.abs() < i64::MAX as f64,
            _ => true,
        });
        if all_integral {
            let values: Vec<Option<i64>> = cells
                .iter()
                .map(|c| match c {
                    Data::Int(i) => Some(*i),
                    Data::Float(f) => Some(*f as i64),
                    _ => None,
                })
                .collect();
            Series::new(name.into(), values)
        } else {
            let values: Vec<Option<f64>> = cells
                .iter()
                .map(|c| match c {
                    Data::Int(i) => Some(*i as f64),
                    Data::Float(f) => Some(*f),
                    _ => None,
                })
                .collect();
            Series::new(name.into(), values)
        }
    } else if all_bool {
        let values: Vec<Option<bool>> = cells
            .iter()
            .map(|c| match c {
                Data::Bool(b) => Some(*b),
                _ => None,
            })
            .collect();
        Series::new(name.into(), values)
    } else {
        let values: Vec<Option<String>> = cells
            .iter()
            .map(|c| match c {
                Data::Empty => None,
                Data::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            })
            .collect();
        Series::new(name.into(), values)
    };

    series.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_names_blank_and_duplicates() {
        let header = vec![
            Data::String("Name".to_string()),
            Data::Empty,
            Data::String("Name".to_string()),
        ];
        assert_eq!(header_names(&header), vec!["Name", "column_2", "Name_2"]);
    }

    #[test]
    fn test_build_column_integral_floats_become_int() {
        let a = Data::Float(10.0);
        let b = Data::Int(20);
        let c = Data::Empty;
        let column = build_column("Score", &[&a, &b, &c]);

        assert_eq!(column.dtype(), &DataType::Int64);
        assert_eq!(column.null_count(), 1);
    }

    #[test]
    fn test_build_column_mixed_becomes_string() {
        let a = Data::Float(1.5);
        let b = Data::String("x".to_string());
        let column = build_column("Mixed", &[&a, &b]);

        assert_eq!(column.dtype(), &DataType::String);
    }

    #[test]
    fn test_build_column_fractional_stays_float() {
        let a = Data::Float(1.5);
        let b = Data::Int(2);
        let column = build_column("Ratio", &[&a, &b]);

        assert_eq!(column.dtype(), &DataType::Float64);
    }
}
