//! Configuration types for the data report pipeline.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic pipeline setup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the report pipeline.
///
/// Use [`PipelineConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use data_report::config::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .output_dir("reports")
///     .top_n(5)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Base directory that receives one sub-directory per run.
    /// Relative paths are resolved against the current working directory.
    /// Default: "output"
    pub output_dir: PathBuf,

    /// Number of bars in the top-values chart.
    /// Default: 10
    pub top_n: usize,

    /// Number of column records listed in the report's column summary.
    /// Default: 8
    pub summary_max_columns: usize,

    /// Number of rows shown in the report's sample table.
    /// Default: 6
    pub sample_max_rows: usize,

    /// Number of columns shown in the report's sample table.
    /// Default: 6
    pub sample_max_columns: usize,

    /// Maximum characters of a sample table cell.
    /// Default: 20
    pub cell_max_chars: usize,

    /// Maximum characters of a sample table header.
    /// Default: 15
    pub header_max_chars: usize,

    /// Raster resolution of chart images.
    /// Default: 150
    pub chart_dpi: u32,

    /// Chart width in inches.
    /// Default: 6.0
    pub chart_width_in: f64,

    /// Chart height in inches.
    /// Default: 4.0
    pub chart_height_in: f64,

    /// Font used for chart text. When `None` or unreadable, common system
    /// font locations are searched, then a bundled DejaVu Sans is used.
    ///
    /// The chart font is registered once per process: the first pipeline's
    /// choice stays in effect and a different path given later is ignored
    /// with a warning.
    /// Default: None
    pub chart_font_path: Option<PathBuf>,

    /// Whether to write `summary_<timestamp>.json` next to the report.
    /// Default: true
    pub write_summary_json: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            top_n: 10,
            summary_max_columns: 8,
            sample_max_rows: 6,
            sample_max_columns: 6,
            cell_max_chars: 20,
            header_max_chars: 15,
            chart_dpi: 150,
            chart_width_in: 6.0,
            chart_height_in: 4.0,
            chart_font_path: None,
            write_summary_json: true,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let limits = [
            ("top_n", self.top_n),
            ("summary_max_columns", self.summary_max_columns),
            ("sample_max_rows", self.sample_max_rows),
            ("sample_max_columns", self.sample_max_columns),
            ("cell_max_chars", self.cell_max_chars),
            ("header_max_chars", self.header_max_chars),
        ];
        for (field, value) in limits {
            if value == 0 {
                return Err(ConfigValidationError::ZeroLimit(field.to_string()));
            }
        }

        if self.chart_dpi == 0 {
            return Err(ConfigValidationError::InvalidDpi(self.chart_dpi));
        }

        for (field, value) in [
            ("chart_width_in", self.chart_width_in),
            ("chart_height_in", self.chart_height_in),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigValidationError::InvalidChartSize {
                    field: field.to_string(),
                    value,
                });
            }
        }

        Ok(())
    }

    /// Chart size in pixels (inches times DPI).
    pub fn chart_pixels(&self) -> (u32, u32) {
        let dpi = f64::from(self.chart_dpi);
        (
            (self.chart_width_in * dpi).round() as u32,
            (self.chart_height_in * dpi).round() as u32,
        )
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid value for '{0}': must be at least 1")]
    ZeroLimit(String),

    #[error("Invalid chart DPI: {0} (must be at least 1)")]
    InvalidDpi(u32),

    #[error("Invalid chart size for '{field}': {value} (must be a positive number of inches)")]
    InvalidChartSize { field: String, value: f64 },
}

impl From<ConfigValidationError> for crate::error::ReportError {
    fn from(err: ConfigValidationError) -> Self {
        crate::error::ReportError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    output_dir: Option<PathBuf>,
    top_n: Option<usize>,
    summary_max_columns: Option<usize>,
    sample_max_rows: Option<usize>,
    sample_max_columns: Option<usize>,
    cell_max_chars: Option<usize>,
    header_max_chars: Option<usize>,
    chart_dpi: Option<u32>,
    chart_size_in: Option<(f64, f64)>,
    chart_font_path: Option<PathBuf>,
    write_summary_json: Option<bool>,
}

impl PipelineConfigBuilder {
    /// Set the base output directory.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Set the number of bars in the top-values chart.
    pub fn top_n(mut self, n: usize) -> Self {
        self.top_n = Some(n);
        self
    }

    /// Set how many column records the report lists.
    pub fn summary_max_columns(mut self, n: usize) -> Self {
        self.summary_max_columns = Some(n);
        self
    }

    /// Set the sample table's row and column limits.
    pub fn sample_size(mut self, rows: usize, columns: usize) -> Self {
        self.sample_max_rows = Some(rows);
        self.sample_max_columns = Some(columns);
        self
    }

    /// Set the truncation lengths for sample cells and headers.
    pub fn truncation(mut self, cell_chars: usize, header_chars: usize) -> Self {
        self.cell_max_chars = Some(cell_chars);
        self.header_max_chars = Some(header_chars);
        self
    }

    /// Set the chart resolution.
    pub fn chart_dpi(mut self, dpi: u32) -> Self {
        self.chart_dpi = Some(dpi);
        self
    }

    /// Set the chart size in inches.
    pub fn chart_size_in(mut self, width: f64, height: f64) -> Self {
        self.chart_size_in = Some((width, height));
        self
    }

    /// Set the font file used for chart text.
    pub fn chart_font_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chart_font_path = Some(path.into());
        self
    }

    /// Enable or disable the JSON summary artifact.
    pub fn write_summary_json(mut self, write: bool) -> Self {
        self.write_summary_json = Some(write);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let defaults = PipelineConfig::default();
        let (chart_width_in, chart_height_in) = self
            .chart_size_in
            .unwrap_or((defaults.chart_width_in, defaults.chart_height_in));

        let config = PipelineConfig {
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
            top_n: self.top_n.unwrap_or(defaults.top_n),
            summary_max_columns: self
                .summary_max_columns
                .unwrap_or(defaults.summary_max_columns),
            sample_max_rows: self.sample_max_rows.unwrap_or(defaults.sample_max_rows),
            sample_max_columns: self
                .sample_max_columns
                .unwrap_or(defaults.sample_max_columns),
            cell_max_chars: self.cell_max_chars.unwrap_or(defaults.cell_max_chars),
            header_max_chars: self.header_max_chars.unwrap_or(defaults.header_max_chars),
            chart_dpi: self.chart_dpi.unwrap_or(defaults.chart_dpi),
            chart_width_in,
            chart_height_in,
            chart_font_path: self.chart_font_path,
            write_summary_json: self
                .write_summary_json
                .unwrap_or(defaults.write_summary_json),
        };

        config.validate()?;
        Ok(config)
    }
}
