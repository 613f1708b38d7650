use super::document::{ReportDocument, Style};
use crate::config::PipelineConfig;
use crate::error::{ReportError, Result};
use crate::types::{ColumnDiagnostic, NamedSummary, SkippedFile};
use crate::utils::{series_to_strings, truncate_chars};
use chrono::{DateTime, Local};
use polars::prelude::*;
use std::backtrace::Backtrace;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const BODY_SIZE: f32 = 10.0;
const TABLE_SIZE: f32 = 8.0;
const TRACE_SIZE: f32 = 6.5;
/// Backtrace lines printed per failed section.
const MAX_TRACE_LINES: usize = 60;

/// Everything the composer needs to describe one run.
pub struct ReportInput<'a> {
    pub table: &'a DataFrame,
    pub summaries: &'a [NamedSummary],
    pub read_files: &'a [String],
    pub skipped_files: &'a [SkippedFile],
    pub cleaning_notes: &'a [ColumnDiagnostic],
    pub duplicates_removed: usize,
    pub charts: &'a [PathBuf],
    pub generated_at: DateTime<Local>,
}

/// A report section that could not be rendered.
#[derive(Debug)]
pub struct SectionFailure {
    pub section: &'static str,
    pub error: ReportError,
    pub backtrace: String,
}

/// Lays out the PDF report.
///
/// Sections are rendered independently. A failing section is recorded and
/// the remaining sections still render; all failures are listed on a final
/// diagnostics page.
pub struct ReportComposer {
    summary_max_columns: usize,
    sample_max_rows: usize,
    sample_max_columns: usize,
    cell_max_chars: usize,
    header_max_chars: usize,
}

type Section = fn(&ReportComposer, &mut ReportDocument, &ReportInput<'_>) -> Result<()>;

impl ReportComposer {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            summary_max_columns: config.summary_max_columns,
            sample_max_rows: config.sample_max_rows,
            sample_max_columns: config.sample_max_columns,
            cell_max_chars: config.cell_max_chars,
            header_max_chars: config.header_max_chars,
        }
    }

    /// Write the report to `path` and return the sections that failed.
    ///
    /// `progress` is called with the fraction of sections done (0-100).
    pub fn compose(
        &self,
        input: &ReportInput<'_>,
        path: &Path,
        progress: &mut dyn FnMut(u8, &str),
    ) -> Result<Vec<SectionFailure>> {
        let (doc, failures) = self.render(input, progress)?;
        doc.save(path)?;
        info!("Report saved: {}", path.display());
        Ok(failures)
    }

    fn render(
        &self,
        input: &ReportInput<'_>,
        progress: &mut dyn FnMut(u8, &str),
    ) -> Result<(ReportDocument, Vec<SectionFailure>)> {
        let sections: [(&'static str, Section); 4] = [
            ("Dataset Summary", Self::dataset_summary),
            ("Column-wise Summary", Self::column_summary),
            ("Sample Data", Self::sample_rows),
            ("Charts", Self::charts),
        ];

        let mut doc = ReportDocument::new("Data Processing Report")?;
        let mut failures = Vec::new();

        for (idx, (name, render)) in sections.iter().enumerate() {
            if let Err(error) = render(self, &mut doc, input) {
                warn!("Report section '{}' failed: {}", name, error);
                failures.push(SectionFailure {
                    section: name,
                    error,
                    backtrace: Backtrace::force_capture().to_string(),
                });
            }
            let done = idx + 1;
            progress(
                (done * 100 / sections.len()) as u8,
                &format!("Rendered {name}"),
            );
        }

        if !failures.is_empty() {
            Self::diagnostics_page(&mut doc, &failures);
        }
        Ok((doc, failures))
    }

    fn dataset_summary(&self, doc: &mut ReportDocument, input: &ReportInput<'_>) -> Result<()> {
        doc.heading("Dataset Summary");

        let lines = [
            format!(
                "Processed at: {}",
                input.generated_at.format("%Y-%m-%d %H:%M:%S")
            ),
            format!("Input files: {}", input.read_files.join(", ")),
            format!("Total rows: {}", input.table.height()),
            format!("Total columns: {}", input.table.width()),
            format!("Duplicates removed: {}", input.duplicates_removed),
        ];
        for line in &lines {
            doc.paragraph(line, BODY_SIZE, Style::Regular);
        }

        if !input.skipped_files.is_empty() {
            doc.spacer(2.0);
            doc.paragraph("Skipped files:", BODY_SIZE, Style::Bold);
            for skipped in input.skipped_files {
                let line = format!("{}: {}", skipped.name, skipped.reason);
                doc.indented(&line, BODY_SIZE, 5.0, Style::Regular);
            }
        }

        if !input.cleaning_notes.is_empty() {
            doc.spacer(2.0);
            doc.paragraph("Processing notes:", BODY_SIZE, Style::Bold);
            for note in input.cleaning_notes {
                let line = format!("{}: {}", note.column, note.message);
                doc.indented(&line, BODY_SIZE, 5.0, Style::Regular);
            }
        }
        Ok(())
    }

    fn column_summary(&self, doc: &mut ReportDocument, input: &ReportInput<'_>) -> Result<()> {
        doc.heading("Column-wise Summary (sample)");

        for named in input.summaries.iter().take(self.summary_max_columns) {
            let fields = named
                .summary
                .fields()
                .into_iter()
                .map(|(key, value)| format!("{key}: {value}"))
                .collect::<Vec<_>>()
                .join(", ");
            doc.paragraph(&named.column, BODY_SIZE, Style::Bold);
            doc.indented(&fields, BODY_SIZE, 5.0, Style::Regular);
        }

        let omitted = input.summaries.len().saturating_sub(self.summary_max_columns);
        if omitted > 0 {
            doc.spacer(1.0);
            doc.paragraph(
                &format!("... and {omitted} more columns"),
                BODY_SIZE,
                Style::Italic,
            );
        }
        Ok(())
    }

    fn sample_rows(&self, doc: &mut ReportDocument, input: &ReportInput<'_>) -> Result<()> {
        doc.heading("Sample Data");

        let sample = input.table.head(Some(self.sample_max_rows));
        let columns: Vec<&Column> = sample
            .get_columns()
            .iter()
            .take(self.sample_max_columns)
            .collect();
        if columns.is_empty() {
            doc.paragraph("No columns to display.", BODY_SIZE, Style::Italic);
            return Ok(());
        }

        let headers: Vec<String> = columns
            .iter()
            .map(|c| truncate_chars(c.name().as_str(), self.header_max_chars).to_string())
            .collect();

        let mut cells = Vec::with_capacity(columns.len());
        for column in &columns {
            let values = series_to_strings(column.as_materialized_series()).map_err(|e| {
                ReportError::ReportSection {
                    section: "Sample Data".to_string(),
                    reason: format!("column '{}': {e}", column.name()),
                }
            })?;
            cells.push(values);
        }

        doc.table_row(&headers, TABLE_SIZE, Style::Bold);
        for row in 0..sample.height() {
            let values: Vec<String> = cells
                .iter()
                .map(|col| truncate_chars(&col[row], self.cell_max_chars).to_string())
                .collect();
            doc.table_row(&values, TABLE_SIZE, Style::Regular);
        }
        Ok(())
    }

    fn charts(&self, doc: &mut ReportDocument, input: &ReportInput<'_>) -> Result<()> {
        if input.charts.is_empty() {
            return Ok(());
        }
        doc.heading("Charts");
        for chart in input.charts {
            doc.image(chart).map_err(|e| ReportError::ReportSection {
                section: "Charts".to_string(),
                reason: format!("{}: {e}", chart.display()),
            })?;
        }
        Ok(())
    }

    fn diagnostics_page(doc: &mut ReportDocument, failures: &[SectionFailure]) {
        doc.new_page();
        doc.heading("Report Diagnostics");
        doc.paragraph(
            "Some sections could not be rendered. Details follow.",
            BODY_SIZE,
            Style::Italic,
        );

        for failure in failures {
            doc.spacer(3.0);
            doc.paragraph(failure.section, BODY_SIZE, Style::Bold);
            doc.paragraph(&failure.error.to_string(), BODY_SIZE, Style::Regular);
            for line in failure.backtrace.lines().take(MAX_TRACE_LINES) {
                doc.indented(line.trim_end(), TRACE_SIZE, 3.0, Style::Regular);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn input<'a>(
        table: &'a DataFrame,
        summaries: &'a [NamedSummary],
        charts: &'a [PathBuf],
    ) -> ReportInput<'a> {
        ReportInput {
            table,
            summaries,
            read_files: &[],
            skipped_files: &[],
            cleaning_notes: &[],
            duplicates_removed: 0,
            charts,
            generated_at: Local::now(),
        }
    }

    #[test]
    fn test_compose_writes_pdf() {
        let dir = TempDir::new().unwrap();
        let df = df! {
            "Name" => ["Al", "Bo"],
            "Score" => [10i64, 20],
        }
        .unwrap();
        let summaries = crate::profiler::summarize(&df);
        let path = dir.path().join("report.pdf");

        let composer = ReportComposer::new(&PipelineConfig::default());
        let failures = composer
            .compose(&input(&df, &summaries, &[]), &path, &mut |_, _| {})
            .unwrap();

        assert!(failures.is_empty());
        assert!(path.is_file());
    }

    #[test]
    fn test_missing_chart_becomes_diagnostic() {
        let dir = TempDir::new().unwrap();
        let df = df! { "x" => [1i64] }.unwrap();
        let charts = vec![dir.path().join("missing.png")];
        let path = dir.path().join("report.pdf");

        let composer = ReportComposer::new(&PipelineConfig::default());
        let failures = composer
            .compose(&input(&df, &[], &charts), &path, &mut |_, _| {})
            .unwrap();

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].section, "Charts");
        assert!(path.is_file());
    }

    #[test]
    fn test_unprintable_column_fails_sample_section_only() {
        let dir = TempDir::new().unwrap();
        let tags = Series::new(
            "tags".into(),
            [
                Series::new(PlSmallStr::EMPTY, [1i64, 2]),
                Series::new(PlSmallStr::EMPTY, [3i64]),
            ],
        );
        let df = DataFrame::new(vec![tags.into()]).unwrap();
        let path = dir.path().join("report.pdf");

        let composer = ReportComposer::new(&PipelineConfig::default());
        let failures = composer
            .compose(&input(&df, &[], &[]), &path, &mut |_, _| {})
            .unwrap();

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].section, "Sample Data");
        assert_eq!(failures[0].error.error_code(), "REPORT_SECTION_ERROR");
        assert!(path.is_file());
    }

    #[test]
    fn test_section_failure_adds_diagnostics_page() {
        let plain = df! { "x" => [1i64] }.unwrap();
        let tags = Series::new(
            "tags".into(),
            [Series::new(PlSmallStr::EMPTY, [1i64])],
        );
        let broken = DataFrame::new(vec![tags.into()]).unwrap();
        let composer = ReportComposer::new(&PipelineConfig::default());

        let (clean_doc, clean_failures) =
            composer.render(&input(&plain, &[], &[]), &mut |_, _| {}).unwrap();
        let (doc, failures) = composer
            .render(&input(&broken, &[], &[]), &mut |_, _| {})
            .unwrap();

        assert!(clean_failures.is_empty());
        assert_eq!(clean_doc.page_count(), 1);
        assert_eq!(failures.len(), 1);
        assert!(doc.page_count() >= 2);
    }

    #[test]
    fn test_compose_progress_reaches_100() {
        let dir = TempDir::new().unwrap();
        let df = DataFrame::empty();
        let mut last = 0;

        ReportComposer::new(&PipelineConfig::default())
            .compose(
                &input(&df, &[], &[]),
                &dir.path().join("r.pdf"),
                &mut |pct, _| last = pct,
            )
            .unwrap();

        assert_eq!(last, 100);
    }
}
