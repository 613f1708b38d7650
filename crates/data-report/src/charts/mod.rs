//! Bar charts rendered to PNG with plotters.
//!
//! Two charts are produced per run:
//! - a source breakdown with one bar per input file (row counts)
//! - the most frequent values of the first non-numeric column
//!
//! Chart text needs a font registered with plotters. The font comes from
//! [`PipelineConfig::chart_font_path`] or a list of common system locations,
//! falling back to a copy of DejaVu Sans built into the binary. The font is
//! registered once per process.

use crate::config::PipelineConfig;
use crate::error::{ReportError, Result};
use crate::profiler::frequencies;
use crate::types::{ALL_DATA_BUCKET, ColumnKind, SOURCE_FILE_COLUMN};
use crate::utils::{series_to_strings, truncate_chars};
use plotters::prelude::*;
use plotters::style::{FontStyle, register_font};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};

const FONT_FAMILY: &str = "sans-serif";

const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Longest x label drawn under a bar, in characters.
const MAX_LABEL_CHARS: usize = 18;

/// DejaVu Sans, see `assets/fonts/DejaVuSans-LICENSE.txt`.
const BUNDLED_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

#[derive(Debug)]
struct ChartFont {
    requested: Option<PathBuf>,
    available: bool,
}

static CHART_FONT: OnceLock<ChartFont> = OnceLock::new();

/// Register a font for chart text once per process.
///
/// The first caller's preferred path wins; a later, different path is
/// reported and ignored.
fn ensure_font(preferred: Option<&Path>) -> bool {
    let font = CHART_FONT.get_or_init(|| ChartFont {
        requested: preferred.map(Path::to_path_buf),
        available: register_first_font(
            preferred
                .into_iter()
                .map(Path::to_path_buf)
                .chain(SYSTEM_FONTS.iter().map(PathBuf::from)),
        ),
    });

    if let Some(path) = preferred {
        if font.requested.as_deref() != Some(path) {
            warn!(
                "Chart font already chosen for this process; ignoring {}",
                path.display()
            );
        }
    }
    font.available
}

/// Register the first readable candidate, or the bundled font if none is.
fn register_first_font(candidates: impl IntoIterator<Item = PathBuf>) -> bool {
    for candidate in candidates {
        let Ok(bytes) = std::fs::read(&candidate) else {
            continue;
        };
        let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
        match register_font(FONT_FAMILY, FontStyle::Normal, bytes) {
            Ok(()) => {
                debug!("Using chart font {}", candidate.display());
                return true;
            }
            Err(_) => warn!("Unusable chart font {}", candidate.display()),
        }
    }

    match register_font(FONT_FAMILY, FontStyle::Normal, BUNDLED_FONT) {
        Ok(()) => {
            debug!("Using bundled chart font");
            true
        }
        Err(_) => {
            warn!("Bundled chart font is unusable; charts will be drawn without text");
            false
        }
    }
}

/// Renders the report charts at a fixed pixel size.
#[derive(Debug, Clone)]
pub struct ChartRenderer {
    width: u32,
    height: u32,
    top_n: usize,
    with_text: bool,
}

impl ChartRenderer {
    pub fn new(config: &PipelineConfig) -> Self {
        let (width, height) = config.chart_pixels();
        Self {
            width,
            height,
            top_n: config.top_n,
            with_text: ensure_font(config.chart_font_path.as_deref()),
        }
    }

    /// Bar chart of row counts per source file.
    pub fn source_breakdown(&self, df: &DataFrame, path: &Path) -> Result<()> {
        let bars = source_counts(df)?;
        self.render(path, "Rows per Source File", "Source File", &bars)?;
        debug!("Rendered source breakdown with {} bars", bars.len());
        Ok(())
    }

    /// Bar chart of the most frequent values of the first non-numeric column.
    ///
    /// Returns `false` without writing anything when every column is numeric.
    pub fn top_values(&self, df: &DataFrame, path: &Path) -> Result<bool> {
        let Some((column, bars)) = top_values(df, self.top_n)? else {
            debug!("No non-numeric column; skipping top values chart");
            return Ok(false);
        };

        let title = format!("Top {} Values in '{}'", bars.len(), column);
        self.render(path, &title, &column, &bars)?;
        Ok(true)
    }

    fn render(&self, path: &Path, title: &str, x_desc: &str, bars: &[(String, usize)]) -> Result<()> {
        self.draw_bars(path, title, x_desc, bars)
            .map_err(|e| ReportError::ChartRender(format!("{}: {e}", path.display())))
    }

    fn draw_bars(
        &self,
        path: &Path,
        title: &str,
        x_desc: &str,
        bars: &[(String, usize)],
    ) -> anyhow::Result<()> {
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let max_count = bars.iter().map(|(_, c)| *c).max().unwrap_or(0) as u32;
        let y_top = max_count + max_count / 10 + 1;
        let x_end = bars.len().max(1) as f64;

        let mut builder = ChartBuilder::on(&root);
        builder
            .margin(15)
            .x_label_area_size(if self.with_text { 120 } else { 10 })
            .y_label_area_size(if self.with_text { 60 } else { 10 });
        if self.with_text {
            builder.caption(title, (FONT_FAMILY, 22));
        }
        let mut chart = builder.build_cartesian_2d(0f64..x_end, 0u32..y_top)?;

        let mut mesh = chart.configure_mesh();
        mesh.disable_x_mesh().x_labels(0);
        if self.with_text {
            mesh.y_desc("Count").label_style((FONT_FAMILY, 14));
        } else {
            mesh.y_labels(0);
        }
        mesh.draw()?;

        chart.draw_series(bars.iter().enumerate().map(|(idx, (_, count))| {
            let x = idx as f64;
            Rectangle::new([(x + 0.15, 0), (x + 0.85, *count as u32)], BLUE.mix(0.7).filled())
        }))?;

        if self.with_text {
            let font_px = 13;
            let step = (font_px as f64 * 0.5) as i32;
            let style = (FONT_FAMILY, font_px).into_font().color(&BLACK);

            for (idx, (label, _)) in bars.iter().enumerate() {
                let (cx, base_y) = chart.backend_coord(&(idx as f64 + 0.5, 0));
                let chars: Vec<char> = truncate_chars(label, MAX_LABEL_CHARS).chars().collect();
                let len = chars.len() as i32;

                // 45 degrees: the label rises to the right and ends under its bar
                for (pos, ch) in chars.iter().enumerate() {
                    let back = len - 1 - pos as i32;
                    let x = cx - step * (back + 1);
                    let y = base_y + 6 + step * back;
                    root.draw(&Text::new(ch.to_string(), (x, y), style.clone()))?;
                }
            }

            let (desc_w, _) = root.estimate_text_size(x_desc, &style)?;
            root.draw(&Text::new(
                x_desc.to_string(),
                (
                    (self.width as i32 - desc_w as i32) / 2,
                    self.height as i32 - font_px - 6,
                ),
                style,
            ))?;
        }

        root.present()?;
        Ok(())
    }
}

/// Row counts per `Source_File` value sorted by name, or one `All_Data`
/// bucket when the column is missing.
pub fn source_counts(df: &DataFrame) -> Result<Vec<(String, usize)>> {
    let Ok(column) = df.column(SOURCE_FILE_COLUMN) else {
        return Ok(vec![(ALL_DATA_BUCKET.to_string(), df.height())]);
    };

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for value in series_to_strings(column.as_materialized_series())? {
        *counts.entry(value).or_default() += 1;
    }
    Ok(counts.into_iter().collect())
}

/// Name of the first non-numeric column and its `n` most frequent values.
pub fn top_values(df: &DataFrame, n: usize) -> Result<Option<(String, Vec<(String, usize)>)>> {
    let Some(column) = df
        .get_columns()
        .iter()
        .find(|c| !ColumnKind::classify(c.dtype()).is_numeric())
    else {
        return Ok(None);
    };

    let values = series_to_strings(column.as_materialized_series())?;
    let mut counts = frequencies(&values);
    counts.truncate(n);
    Ok(Some((column.name().to_string(), counts)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_source_counts_sorted_by_name() {
        let df = df! {
            "x" => [1i64, 2, 3],
            SOURCE_FILE_COLUMN => ["b.csv", "a.csv", "b.csv"],
        }
        .unwrap();

        assert_eq!(
            source_counts(&df).unwrap(),
            vec![("a.csv".to_string(), 1), ("b.csv".to_string(), 2)]
        );
    }

    #[test]
    fn test_source_counts_without_provenance() {
        let df = df! { "x" => [1i64, 2] }.unwrap();
        assert_eq!(
            source_counts(&df).unwrap(),
            vec![(ALL_DATA_BUCKET.to_string(), 2)]
        );
    }

    #[test]
    fn test_top_values_first_non_numeric_column() {
        let df = df! {
            "Score" => [1i64, 2, 3, 4],
            "City" => ["Oslo", "Rome", "Rome", "Bern"],
            "Team" => ["a", "a", "a", "a"],
        }
        .unwrap();

        let (column, counts) = top_values(&df, 2).unwrap().unwrap();
        assert_eq!(column, "City");
        assert_eq!(
            counts,
            vec![("Rome".to_string(), 2), ("Oslo".to_string(), 1)]
        );
    }

    #[test]
    fn test_top_values_all_numeric() {
        let df = df! { "a" => [1i64], "b" => [2.0] }.unwrap();
        assert!(top_values(&df, 10).unwrap().is_none());
    }

    #[test]
    fn test_render_charts() {
        let dir = TempDir::new().unwrap();
        let renderer = ChartRenderer::new(&PipelineConfig::default());
        let df = df! {
            "Name" => ["Al", "Bo", "Al"],
            SOURCE_FILE_COLUMN => ["a.csv", "a.csv", "b.csv"],
        }
        .unwrap();

        let summary = dir.path().join("summary.png");
        let top = dir.path().join("top.png");
        renderer.source_breakdown(&df, &summary).unwrap();
        assert!(renderer.top_values(&df, &top).unwrap());

        assert!(summary.is_file());
        assert!(top.is_file());
    }

    #[test]
    fn test_chart_text_falls_back_to_bundled_font() {
        assert!(register_first_font([PathBuf::from("/nonexistent/font.ttf")]));
        assert!(ChartRenderer::new(&PipelineConfig::default()).with_text);
    }

    #[test]
    fn test_later_font_path_does_not_replace_first() {
        let first = ensure_font(None);
        let other = Path::new("/elsewhere/Other.ttf");

        assert_eq!(ensure_font(Some(other)), first);
        let chosen = CHART_FONT.get().unwrap();
        assert_ne!(chosen.requested.as_deref(), Some(other));
    }

    #[test]
    fn test_bundled_font_is_truetype() {
        assert_eq!(&BUNDLED_FONT[..4], &[0x00, 0x01, 0x00, 0x00]);
    }

    #[test]
    fn test_render_skips_top_values_for_numeric_table() {
        let dir = TempDir::new().unwrap();
        let renderer = ChartRenderer::new(&PipelineConfig::default());
        let df = df! { "x" => [1i64, 2] }.unwrap();
        let top = dir.path().join("top.png");

        assert!(!renderer.top_values(&df, &top).unwrap());
        assert!(!top.exists());
    }
}
