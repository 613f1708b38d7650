use polars::prelude::DataType;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Reserved column holding the base name of the file each row came from.
pub const SOURCE_FILE_COLUMN: &str = "Source_File";

/// Bucket name used by the source breakdown chart when no provenance column exists.
pub const ALL_DATA_BUCKET: &str = "All_Data";

/// Logical type of a column, decided once per column and shared by the
/// cleaner, the summarizer and the chart generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Text,
    Unknown,
}

impl ColumnKind {
    /// Classify a column by its physical dtype.
    pub fn classify(dtype: &DataType) -> Self {
        if crate::utils::is_numeric_dtype(dtype) {
            Self::Numeric
        } else if matches!(dtype, DataType::String) {
            Self::Text
        } else {
            Self::Unknown
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Numeric)
    }
}

/// Descriptive statistics for one column.
///
/// Serializes as `{"type": "numeric", "count": .., ...}` so the record reads
/// the same in the JSON summary and in the PDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColumnSummary {
    Numeric {
        count: usize,
        sum: f64,
        mean: f64,
        min: f64,
        max: f64,
    },
    Text {
        count: usize,
        unique: usize,
        most_common: String,
    },
    Unknown {
        error: String,
    },
}

impl ColumnSummary {
    /// Short type tag used in reports.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Numeric { .. } => "numeric",
            Self::Text { .. } => "text",
            Self::Unknown { .. } => "unknown",
        }
    }

    /// Record fields in display order, `type` first.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("type", self.type_name().to_string())];
        match self {
            Self::Numeric {
                count,
                sum,
                mean,
                min,
                max,
            } => {
                fields.push(("count", count.to_string()));
                fields.push(("sum", format_stat(*sum)));
                fields.push(("mean", format_stat(*mean)));
                fields.push(("min", format_stat(*min)));
                fields.push(("max", format_stat(*max)));
            }
            Self::Text {
                count,
                unique,
                most_common,
            } => {
                fields.push(("count", count.to_string()));
                fields.push(("unique", unique.to_string()));
                fields.push(("most_common", most_common.clone()));
            }
            Self::Unknown { error } => fields.push(("error", error.clone())),
        }
        fields
    }
}

fn format_stat(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// A column summary paired with its column name, in table column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedSummary {
    pub column: String,
    #[serde(flatten)]
    pub summary: ColumnSummary,
}

/// A per-column failure that was recovered without aborting the stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDiagnostic {
    pub column: String,
    pub message: String,
}

/// An input file the merger could not read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub name: String,
    pub reason: String,
}

/// Everything one pipeline run produced.
///
/// Created once per run and handed to the caller; the pipeline keeps no
/// reference to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunArtifacts {
    /// Merged workbook (same content as `cleaned`).
    pub merged: PathBuf,
    /// Cleaned workbook.
    pub cleaned: PathBuf,
    /// PDF report.
    pub report: PathBuf,
    /// Chart images in insertion order.
    pub charts: Vec<PathBuf>,
    /// The run directory holding every file above.
    pub output_dir: PathBuf,
    /// JSON column summary, when enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_json: Option<PathBuf>,
    /// Rows in the final table.
    pub rows: usize,
    /// Columns in the final table.
    pub columns: usize,
    pub duplicates_removed: usize,
    /// Base names of the files that were read.
    pub read_files: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_files: Vec<SkippedFile>,
    /// Recovered per-column and per-section failures.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(ColumnKind::classify(&DataType::Int64), ColumnKind::Numeric);
        assert_eq!(ColumnKind::classify(&DataType::Float32), ColumnKind::Numeric);
        assert_eq!(ColumnKind::classify(&DataType::String), ColumnKind::Text);
        assert_eq!(ColumnKind::classify(&DataType::Boolean), ColumnKind::Unknown);
        assert_eq!(ColumnKind::classify(&DataType::Null), ColumnKind::Unknown);
    }

    #[test]
    fn test_summary_json_shape() {
        let named = NamedSummary {
            column: "Score".to_string(),
            summary: ColumnSummary::Numeric {
                count: 3,
                sum: 60.0,
                mean: 20.0,
                min: 10.0,
                max: 30.0,
            },
        };
        let json = serde_json::to_value(&named).unwrap();
        assert_eq!(json["column"], "Score");
        assert_eq!(json["type"], "numeric");
        assert_eq!(json["count"], 3);
        assert_eq!(json["mean"], 20.0);
    }

    #[test]
    fn test_unknown_summary_fields() {
        let summary = ColumnSummary::Unknown {
            error: "cannot cast".to_string(),
        };
        assert_eq!(
            summary.fields(),
            vec![
                ("type", "unknown".to_string()),
                ("error", "cannot cast".to_string())
            ]
        );
    }

    #[test]
    fn test_numeric_fields_formatting() {
        let summary = ColumnSummary::Numeric {
            count: 2,
            sum: 3.5,
            mean: 1.75,
            min: 1.0,
            max: 2.5,
        };
        let fields = summary.fields();
        assert_eq!(fields[2], ("sum", "3.5".to_string()));
        assert_eq!(fields[4], ("min", "1.0".to_string()));
    }
}
