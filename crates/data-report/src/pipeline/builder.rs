//! The report pipeline and its builder.

use crate::charts::ChartRenderer;
use crate::cleaner::{clean_table, remove_duplicates};
use crate::config::{ConfigValidationError, PipelineConfig};
use crate::error::{ReportError, Result, ResultExt};
use crate::io::write_workbook;
use crate::merger::merge_files;
use crate::pipeline::progress::{
    ClosureProgressReporter, NoopProgressReporter, PipelineStage, ProgressReporter,
    ProgressTracker, ProgressUpdate,
};
use crate::profiler::summarize;
use crate::reporting::{ReportComposer, ReportInput, SummaryDocument, write_summary_json};
use crate::types::RunArtifacts;
use crate::utils::{file_timestamp, run_folder_name};
use chrono::{DateTime, Local};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Merges, cleans and deduplicates input files, then writes workbooks,
/// charts and a PDF report into a fresh run directory.
///
/// Use [`Pipeline::builder()`] to create a pipeline.
///
/// # Example
///
/// ```rust,ignore
/// use data_report::{Pipeline, PipelineConfig};
///
/// let artifacts = Pipeline::builder()
///     .config(PipelineConfig::builder().output_dir("reports").build()?)
///     .on_progress(|update| println!("[{:>3}%] {}", update.percent, update.message))
///     .build()?
///     .run(&["sales_q1.csv", "sales_q2.xlsx"])?;
///
/// println!("Report: {}", artifacts.report.display());
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    progress_reporter: Arc<dyn ProgressReporter>,
    charts: ChartRenderer,
    composer: ReportComposer,
}

// Runs are usually started on a worker thread
static_assertions::assert_impl_all!(Pipeline: Send, Sync);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline over `paths`.
    ///
    /// Emits a final progress update at 100% whether the run succeeds or
    /// fails; on failure its message is the error text.
    ///
    /// # Errors
    ///
    /// - [`ReportError::InvalidInput`] when `paths` is empty
    /// - [`ReportError::NoReadableData`] when none of the files could be read
    /// - any I/O, workbook, chart or PDF error that stops the run
    ///
    /// Files already written to the run directory stay on disk.
    pub fn run<P: AsRef<Path>>(&self, paths: &[P]) -> Result<RunArtifacts> {
        let mut tracker = ProgressTracker::new(self.progress_reporter.as_ref());

        match self.run_internal(paths, &mut tracker) {
            Ok(artifacts) => {
                tracker.emit(ProgressUpdate::complete(format!(
                    "Report generated in {}",
                    artifacts.output_dir.display()
                )));
                Ok(artifacts)
            }
            Err(e) => {
                error!("Pipeline error: {}", e);
                tracker.emit(ProgressUpdate::failed(e.to_string()));
                Err(e)
            }
        }
    }

    fn run_internal<P: AsRef<Path>>(
        &self,
        paths: &[P],
        tracker: &mut ProgressTracker<'_>,
    ) -> Result<RunArtifacts> {
        let start_time = Instant::now();

        info!("Starting report pipeline for {} files", paths.len());
        tracker.update(PipelineStage::Initializing, 0, "Starting...");
        if paths.is_empty() {
            return Err(ReportError::InvalidInput("No files provided.".to_string()));
        }

        // Step 1: Load and merge
        info!("Step 1: Loading files...");
        tracker.update(PipelineStage::Loading, 0, "Loading files...");
        let merged = merge_files(paths, &mut |pct, msg| {
            tracker.update(PipelineStage::Loading, pct, msg)
        })?;
        let rows_merged = merged.table.height();

        let now = Local::now();
        let output_dir = self.create_run_dir(&now)?;
        let stamp = file_timestamp(&now);
        info!("Writing run output to {}", output_dir.display());

        // Step 2: Clean
        info!("Step 2: Cleaning {} rows...", rows_merged);
        tracker.update(PipelineStage::Cleaning, 0, "Cleaning data...");
        let cleaned = clean_table(merged.table, &mut |pct, msg| {
            tracker.update(PipelineStage::Cleaning, pct, msg)
        })?;

        // Step 3: Deduplicate
        info!("Step 3: Removing duplicates...");
        tracker.update(PipelineStage::Deduplicating, 0, "Removing duplicates...");
        let (table, duplicates_removed) = remove_duplicates(cleaned.table)?;
        tracker.update(
            PipelineStage::Deduplicating,
            100,
            &format!("Removed {duplicates_removed} duplicate rows"),
        );

        // Step 4: Save workbooks
        info!("Step 4: Saving workbooks...");
        tracker.update(PipelineStage::Saving, 0, "Saving workbooks...");
        let merged_path = output_dir.join(format!("merged_output_{stamp}.xlsx"));
        let cleaned_path = output_dir.join(format!("cleaned_output_{stamp}.xlsx"));
        write_workbook(&table, &merged_path).context("Saving merged workbook")?;
        write_workbook(&table, &cleaned_path).context("Saving cleaned workbook")?;

        // Step 5: Summarize
        info!("Step 5: Summarizing columns...");
        tracker.update(PipelineStage::Summarizing, 0, "Summarizing columns...");
        let summaries = summarize(&table);

        // Step 6: Charts
        info!("Step 6: Rendering charts...");
        tracker.update(PipelineStage::Charting, 0, "Rendering charts...");
        let mut charts = Vec::new();
        let summary_chart = output_dir.join(format!("chart_summary_{stamp}.png"));
        self.charts.source_breakdown(&table, &summary_chart)?;
        charts.push(summary_chart);
        tracker.update(PipelineStage::Charting, 50, "Rendered source breakdown");

        let top_chart = output_dir.join(format!("chart_top_values_{stamp}.png"));
        if self.charts.top_values(&table, &top_chart)? {
            charts.push(top_chart);
        }
        tracker.update(PipelineStage::Charting, 100, "Charts rendered");

        // Step 7: Report
        info!("Step 7: Composing report...");
        tracker.update(PipelineStage::Reporting, 0, "Composing report...");
        let report_path = output_dir.join(format!("summary_report_{stamp}.pdf"));
        let input = ReportInput {
            table: &table,
            summaries: &summaries,
            read_files: &merged.read_files,
            skipped_files: &merged.skipped,
            cleaning_notes: &cleaned.diagnostics,
            duplicates_removed,
            charts: &charts,
            generated_at: now,
        };
        let failures = self.composer.compose(&input, &report_path, &mut |pct, msg| {
            tracker.update(PipelineStage::Reporting, pct, msg)
        })?;

        let summary_json = if self.config.write_summary_json {
            let path = output_dir.join(format!("summary_{stamp}.json"));
            let document = SummaryDocument {
                generated_at: now.format("%Y-%m-%d %H:%M:%S").to_string(),
                read_files: merged.read_files.clone(),
                skipped_files: merged.skipped.clone(),
                rows: table.height(),
                columns: table.width(),
                duplicates_removed,
                column_summary: summaries,
                cleaning_notes: cleaned.diagnostics.clone(),
            };
            write_summary_json(&document, &path)?;
            Some(path)
        } else {
            None
        };

        let diagnostics = cleaned
            .diagnostics
            .iter()
            .map(|d| format!("Column '{}': {}", d.column, d.message))
            .chain(
                failures
                    .iter()
                    .map(|f| format!("Report section '{}': {}", f.section, f.error)),
            )
            .collect();

        info!(
            "Pipeline finished in {} ms: {} rows, {} duplicates removed",
            start_time.elapsed().as_millis(),
            table.height(),
            duplicates_removed
        );

        Ok(RunArtifacts {
            merged: merged_path,
            cleaned: cleaned_path,
            report: report_path,
            charts,
            output_dir,
            summary_json,
            rows: table.height(),
            columns: table.width(),
            duplicates_removed,
            read_files: merged.read_files,
            skipped_files: merged.skipped,
            diagnostics,
        })
    }

    /// Create the run directory, appending `-2`, `-3`, ... if the
    /// timestamped name is taken.
    fn create_run_dir(&self, now: &DateTime<Local>) -> Result<PathBuf> {
        let base = std::env::current_dir()?.join(&self.config.output_dir);
        create_unique_dir(&base, &run_folder_name(now))
    }
}

fn create_unique_dir(base: &Path, name: &str) -> Result<PathBuf> {
    fs::create_dir_all(base).context(format!("Creating {}", base.display()))?;

    let mut attempt = 1;
    loop {
        let candidate = if attempt == 1 {
            base.join(name)
        } else {
            base.join(format!("{name}-{attempt}"))
        };
        match fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => {
                return Err(ReportError::Io(e).with_context(format!(
                    "Creating run directory {}",
                    candidate.display()
                )));
            }
        }
    }
}

/// Run with the default configuration, reporting `(percent, status)` pairs
/// to `on_progress`.
pub fn run<P, F>(paths: &[P], on_progress: F) -> Result<RunArtifacts>
where
    P: AsRef<Path>,
    F: Fn(u8, &str) + Send + Sync + 'static,
{
    Pipeline::builder()
        .on_progress(move |update| on_progress(update.percent, &update.message))
        .build()?
        .run(paths)
}

/// Builder for [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during a run.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use data_report::{ProgressReporter, ProgressUpdate};
    /// use std::sync::Arc;
    ///
    /// struct StderrReporter;
    ///
    /// impl ProgressReporter for StderrReporter {
    ///     fn report(&self, update: ProgressUpdate) {
    ///         eprintln!("{}: {}", update.stage.display_name(), update.message);
    ///     }
    /// }
    ///
    /// let pipeline = Pipeline::builder()
    ///     .progress_reporter(Arc::new(StderrReporter))
    ///     .build()?;
    /// ```
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// This is a convenience method for simple progress handling.
    /// For more complex scenarios, use [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(Pipeline {
            charts: ChartRenderer::new(&config),
            composer: ReportComposer::new(&config),
            progress_reporter: self
                .progress_reporter
                .unwrap_or_else(|| Arc::new(NoopProgressReporter)),
            config,
        })
    }
}
