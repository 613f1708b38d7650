//! Report output.
//!
//! - [`ReportComposer`] writes the paginated PDF report: dataset summary,
//!   column summaries, a sample of rows and the chart images.
//! - [`write_summary_json`] writes the same figures as JSON.
//!
//! # Example
//!
//! ```rust,ignore
//! use data_report::reporting::{ReportComposer, ReportInput};
//!
//! let composer = ReportComposer::new(&config);
//! let failures = composer.compose(&input, &report_path, &mut |_, _| {})?;
//! for failure in &failures {
//!     eprintln!("{}: {}", failure.section, failure.error);
//! }
//! ```

mod composer;
mod document;
mod summary;

pub use composer::{ReportComposer, ReportInput, SectionFailure};
pub use summary::{SummaryDocument, write_summary_json};
