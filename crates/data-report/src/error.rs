//! Custom error types for the data report pipeline.
//!
//! Failures local to one unit of work (one file, one column, one report
//! section) are recovered where they happen and only show up here as the
//! payload of a diagnostic. Failures that make the run meaningless (no input,
//! no readable data) propagate to the caller and end the run.
//!
//! Errors are serializable so an embedding UI can display them.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the report pipeline.
#[derive(Error, Debug)]
pub enum ReportError {
    /// No input files were supplied.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// None of the supplied files could be read.
    #[error("No readable data found in the provided files.")]
    NoReadableData,

    /// A single file could not be loaded.
    #[error("Failed to load '{path}': {reason}")]
    Load { path: String, reason: String },

    /// Cleaning or summarizing one column failed.
    #[error("Failed to process column '{column}': {reason}")]
    ColumnProcessing { column: String, reason: String },

    /// One section of the PDF report could not be rendered.
    #[error("Failed to render report section '{section}': {reason}")]
    ReportSection { section: String, reason: String },

    /// A chart could not be rendered or saved.
    #[error("Failed to render chart: {0}")]
    ChartRender(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// PDF document assembly or serialization failed.
    #[error("PDF error: {0}")]
    Pdf(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Workbook writer error wrapper.
    #[error("Workbook error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ReportError>,
    },
}

impl ReportError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ReportError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get error code for frontend handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::NoReadableData => "NO_READABLE_DATA",
            Self::Load { .. } => "LOAD_ERROR",
            Self::ColumnProcessing { .. } => "COLUMN_PROCESSING_ERROR",
            Self::ReportSection { .. } => "REPORT_SECTION_ERROR",
            Self::ChartRender(_) => "CHART_RENDER_ERROR",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Pdf(_) => "PDF_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Xlsx(_) => "XLSX_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// True for errors that abort a run before any output is produced.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::InvalidInput(_) | Self::NoReadableData => true,
            Self::WithContext { source, .. } => source.is_fatal(),
            _ => false,
        }
    }

    /// True for errors that are recovered locally (one file, column or section).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Load { .. } | Self::ColumnProcessing { .. } | Self::ReportSection { .. }
        )
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for ReportError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ReportError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for report pipeline operations.
pub type Result<T> = std::result::Result<T, ReportError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ReportError::Polars(e).with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ReportError::Io(e).with_context(context))
    }
}
