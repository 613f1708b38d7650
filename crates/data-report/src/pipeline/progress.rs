//! Progress reporting for the report pipeline.
//!
//! Each stage owns a fixed percent range. Updates inside a stage carry the
//! fraction of that stage done and are mapped into its range, so callers see
//! one overall percentage that only moves forward and ends at exactly 100.
//!
//! # Example
//!
//! ```rust,ignore
//! use data_report::Pipeline;
//!
//! let artifacts = Pipeline::builder()
//!     .on_progress(|update| {
//!         println!("[{:>3}%] {}", update.percent, update.message);
//!     })
//!     .build()?
//!     .run(&["a.csv", "b.csv"])?;
//! ```

use serde::{Deserialize, Serialize};

/// Stages of one pipeline run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Validating input and preparing the run
    Initializing,
    /// Reading and merging the input files
    Loading,
    /// Cleaning columns
    Cleaning,
    /// Removing duplicate rows
    Deduplicating,
    /// Writing the merged and cleaned workbooks
    Saving,
    /// Computing column summaries
    Summarizing,
    /// Rendering chart images
    Charting,
    /// Composing the PDF report
    Reporting,
    /// Run finished successfully
    Complete,
    /// Run aborted with an error
    Failed,
}

impl PipelineStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Initializing => "Initializing",
            Self::Loading => "Loading Files",
            Self::Cleaning => "Cleaning Data",
            Self::Deduplicating => "Removing Duplicates",
            Self::Saving => "Saving Workbooks",
            Self::Summarizing => "Summarizing Columns",
            Self::Charting => "Rendering Charts",
            Self::Reporting => "Composing Report",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Overall percent range covered by this stage, inclusive.
    pub fn percent_range(&self) -> (u8, u8) {
        match self {
            Self::Initializing => (0, 5),
            Self::Loading => (5, 25),
            Self::Cleaning => (30, 55),
            Self::Deduplicating => (60, 70),
            Self::Saving => (75, 75),
            Self::Summarizing => (80, 80),
            Self::Charting => (85, 90),
            Self::Reporting => (92, 99),
            Self::Complete | Self::Failed => (100, 100),
        }
    }

    /// Overall percent when `stage_percent` (0-100) of this stage is done.
    pub fn percent_at(&self, stage_percent: u8) -> u8 {
        let (start, end) = self.percent_range();
        let span = u32::from(end - start);
        let done = u32::from(stage_percent.min(100));
        start + (span * done / 100) as u8
    }
}

/// One progress notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Current pipeline stage
    pub stage: PipelineStage,

    /// Overall progress (0 - 100)
    pub percent: u8,

    /// Short status line
    pub message: String,
}

impl ProgressUpdate {
    /// Update for `stage` with `stage_percent` (0-100) of the stage done.
    pub fn new(stage: PipelineStage, stage_percent: u8, message: impl Into<String>) -> Self {
        Self {
            stage,
            percent: stage.percent_at(stage_percent),
            message: message.into(),
        }
    }

    /// Final update of a successful run.
    pub fn complete(message: impl Into<String>) -> Self {
        Self::new(PipelineStage::Complete, 100, message)
    }

    /// Final update of a failed run, carrying the error text.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(PipelineStage::Failed, 100, message)
    }

    pub fn is_final(&self) -> bool {
        matches!(self.stage, PipelineStage::Complete | PipelineStage::Failed)
    }
}

/// Receives progress updates during a run.
///
/// The pipeline calls this from whatever thread runs it, so implementations
/// must be `Send + Sync` and must not assume they run on a UI thread.
/// A UI typically forwards the update over a channel to its event loop.
///
/// # Example
///
/// ```rust,ignore
/// use data_report::{ProgressReporter, ProgressUpdate};
/// use std::sync::mpsc::Sender;
///
/// struct ChannelReporter(Sender<ProgressUpdate>);
///
/// impl ProgressReporter for ChannelReporter {
///     fn report(&self, update: ProgressUpdate) {
///         let _ = self.0.send(update);
///     }
/// }
/// ```
pub trait ProgressReporter: Send + Sync {
    /// Called for every progress update. Should return quickly.
    fn report(&self, update: ProgressUpdate);
}

/// Wrapper that implements [`ProgressReporter`] using a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    /// Creates a new closure-based progress reporter.
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

/// Reporter that discards every update. Used when the caller supplies none.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgressReporter;

impl ProgressReporter for NoopProgressReporter {
    fn report(&self, _update: ProgressUpdate) {}
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);
static_assertions::assert_impl_all!(NoopProgressReporter: Send, Sync);

/// Per-run wrapper that keeps reported percents from ever going down.
pub(crate) struct ProgressTracker<'a> {
    reporter: &'a dyn ProgressReporter,
    last: u8,
}

impl<'a> ProgressTracker<'a> {
    pub(crate) fn new(reporter: &'a dyn ProgressReporter) -> Self {
        Self { reporter, last: 0 }
    }

    /// Report `stage_percent` (0-100) of `stage`.
    pub(crate) fn update(&mut self, stage: PipelineStage, stage_percent: u8, message: &str) {
        self.emit(ProgressUpdate::new(stage, stage_percent, message));
    }

    pub(crate) fn emit(&mut self, mut update: ProgressUpdate) {
        update.percent = update.percent.max(self.last);
        self.last = update.percent;
        self.reporter.report(update);
    }
}
