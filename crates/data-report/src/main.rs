//! CLI entry point for the data report pipeline.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use data_report::{Pipeline, PipelineConfig, ProgressUpdate, RunArtifacts};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use tracing::error;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Merge, clean and report on CSV and spreadsheet files",
    long_about = "Merges the given CSV and spreadsheet files, cleans and deduplicates the rows, \
                  and writes workbooks, charts and a PDF report into a new run directory.\n\n\
                  EXAMPLES:\n  \
                  # Report on two files\n  \
                  data-report sales_q1.csv sales_q2.xlsx\n\n  \
                  # Custom output directory and chart size\n  \
                  data-report -o reports --top-n 5 data/*.csv\n\n  \
                  # Machine-readable result\n  \
                  data-report --json a.csv b.csv | jq .report"
)]
struct Args {
    /// Input files (.csv or spreadsheet workbooks)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Base output directory; each run creates a sub-directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON configuration file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of bars in the top-values chart
    #[arg(long)]
    top_n: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output the run artifacts as JSON on stdout
    ///
    /// Disables all progress and log output.
    #[arg(long)]
    json: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    if let Some(output) = &args.output {
        config.output_dir = output.clone();
    }
    if let Some(top_n) = args.top_n {
        config.top_n = top_n;
    }

    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json);

    let config = load_config(&args)?;
    let show_progress = !(args.quiet || args.json);

    // The pipeline runs on a worker thread; progress comes back over a channel
    let (tx, rx) = mpsc::channel::<ProgressUpdate>();
    let pipeline = Pipeline::builder()
        .config(config)
        .on_progress(move |update| {
            let _ = tx.send(update);
        })
        .build()?;

    let files = args.files.clone();
    let worker = thread::spawn(move || pipeline.run(&files));

    for update in rx {
        if show_progress {
            eprintln!("[{:>3}%] {}", update.percent, update.message);
        }
    }

    let outcome = worker
        .join()
        .map_err(|_| anyhow!("Pipeline worker thread panicked"))?;

    match outcome {
        Ok(artifacts) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&artifacts)?);
            } else {
                print_summary(&artifacts);
            }
            Ok(())
        }
        Err(e) => {
            error!("Report generation failed: {}", e);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&e)?);
            }
            Err(e.into())
        }
    }
}

/// Human-readable run summary.
///
/// Uses `println!` because this is the primary output of the command and
/// must show regardless of the log level.
fn print_summary(artifacts: &RunArtifacts) {
    println!("\n{}", "=".repeat(60));
    println!("REPORT GENERATED");
    println!("{}", "=".repeat(60));
    println!("  Output folder:      {}", artifacts.output_dir.display());
    println!("  Files read:         {}", artifacts.read_files.join(", "));
    for skipped in &artifacts.skipped_files {
        println!("  Skipped:            {} ({})", skipped.name, skipped.reason);
    }
    println!("  Rows:               {}", artifacts.rows);
    println!("  Columns:            {}", artifacts.columns);
    println!("  Duplicates removed: {}", artifacts.duplicates_removed);
    println!();
    println!("  Merged workbook:    {}", artifacts.merged.display());
    println!("  Cleaned workbook:   {}", artifacts.cleaned.display());
    for chart in &artifacts.charts {
        println!("  Chart:              {}", chart.display());
    }
    println!("  Report:             {}", artifacts.report.display());
    if let Some(summary) = &artifacts.summary_json {
        println!("  Summary JSON:       {}", summary.display());
    }

    if !artifacts.diagnostics.is_empty() {
        println!();
        println!("NOTES");
        println!("{}", "-".repeat(40));
        for note in &artifacts.diagnostics {
            println!("  - {note}");
        }
    }
}
