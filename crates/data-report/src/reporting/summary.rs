use crate::error::Result;
use crate::types::{ColumnDiagnostic, NamedSummary, SkippedFile};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Machine-readable companion to the PDF report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryDocument {
    pub generated_at: String,
    pub read_files: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_files: Vec<SkippedFile>,
    pub rows: usize,
    pub columns: usize,
    pub duplicates_removed: usize,
    pub column_summary: Vec<NamedSummary>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cleaning_notes: Vec<ColumnDiagnostic>,
}

/// Write the summary as pretty-printed JSON.
pub fn write_summary_json(summary: &SummaryDocument, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, summary)?;
    writer.flush()?;

    info!("Summary saved: {}", path.display());
    Ok(())
}
