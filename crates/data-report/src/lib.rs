//! Data Report Library
//!
//! Merge spreadsheet and CSV files, clean and deduplicate the rows, and
//! produce workbooks, charts and a PDF report for each run.
//!
//! # Overview
//!
//! A run goes through these stages, in order:
//!
//! - **Loading**: every file is read into a DataFrame and tagged with a
//!   `Source_File` column. Unreadable files are skipped and reported.
//! - **Cleaning**: text is trimmed, missing values become `""` or `0`
//!   depending on the column type.
//! - **Deduplication**: exact duplicate rows are removed, keeping the first.
//! - **Saving**: the table is written as the merged and cleaned workbooks.
//! - **Summarizing**: per-column statistics (numeric or text).
//! - **Charting**: rows per source file and the top values of the first
//!   non-numeric column.
//! - **Reporting**: a paginated PDF and a JSON summary.
//!
//! Every run writes into its own `Data-Report-<timestamp>` directory below
//! the configured output directory.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use data_report::{Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::builder()
//!     .output_dir("output")
//!     .top_n(10)
//!     .build()?;
//!
//! let artifacts = Pipeline::builder()
//!     .config(config)
//!     .on_progress(|update| {
//!         println!("[{:>3}%] {}", update.percent, update.message);
//!     })
//!     .build()?
//!     .run(&["a.csv", "b.xlsx"])?;
//!
//! println!("{} rows, {} duplicates removed", artifacts.rows, artifacts.duplicates_removed);
//! println!("Report: {}", artifacts.report.display());
//! ```
//!
//! # Errors
//!
//! Problems confined to one file, column or report section are recovered
//! and surface in [`RunArtifacts::diagnostics`]. An empty file list or a run
//! where no file could be read fails with [`ReportError`].

pub mod charts;
pub mod cleaner;
pub mod config;
pub mod error;
pub mod io;
pub mod merger;
pub mod pipeline;
pub mod profiler;
pub mod reporting;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use charts::ChartRenderer;
pub use cleaner::{CleanOutcome, clean_table, remove_duplicates};
pub use config::{ConfigValidationError, PipelineConfig, PipelineConfigBuilder};
pub use error::{ReportError, Result as ReportResult, ResultExt};
pub use io::load_file;
pub use merger::{MergeOutcome, merge_files};
pub use pipeline::{
    ClosureProgressReporter, NoopProgressReporter, Pipeline, PipelineBuilder, PipelineStage,
    ProgressReporter, ProgressUpdate, run,
};
pub use profiler::summarize;
pub use types::{
    ColumnDiagnostic, ColumnKind, ColumnSummary, NamedSummary, RunArtifacts, SOURCE_FILE_COLUMN,
    SkippedFile,
};
