//! MacroLab CLI: collect, inspect and store macroeconomic series.
//!
//! Commands:
//! - `collect`: read the metadata table, collect every API series, harmonize
//!   by frequency and write the parquet frames
//! - `windows`: show how a date span is split for daily central-bank requests
//! - `status`: report the stored frames

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use macrolab_core::clock::{Clock, FixedClock, SystemClock};
use macrolab_core::config::{CollectorConfig, FailurePolicy};
use macrolab_core::data::{
    harmonize, load_metadata, split_date_range, Collector, Fetcher, FrameStore, HttpTransport,
    LogProgress, DEFAULT_SPAN_YEARS,
};
use macrolab_core::domain::{format_br, parse_br};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "macrolab",
    about = "MacroLab CLI: macroeconomic time-series collection"
)]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect every API series listed in the metadata table.
    Collect {
        /// Metadata table: CSV or XLSX, local path or URL.
        #[arg(long)]
        metadata: String,

        /// TOML configuration file. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory. Overrides `output.dir` from the config.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Abort on the first series that fails.
        #[arg(long, default_value_t = false)]
        fail_fast: bool,

        /// Pretend today is this date (YYYY-MM-DD).
        #[arg(long)]
        today: Option<String>,
    },
    /// Print the request windows for a daily span.
    Windows {
        /// Start date (dd/mm/yyyy).
        #[arg(long)]
        start: String,

        /// End date (dd/mm/yyyy).
        #[arg(long)]
        end: String,

        /// Window length in years; 0 disables splitting.
        #[arg(long, default_value_t = DEFAULT_SPAN_YEARS)]
        years: u32,
    },
    /// Report the stored frames.
    Status {
        /// Output directory. Defaults to ./dados.
        #[arg(long, default_value = "dados")]
        output_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    match cli.command {
        Commands::Collect {
            metadata,
            config,
            output_dir,
            fail_fast,
            today,
        } => run_collect(&metadata, config.as_deref(), output_dir, fail_fast, today),
        Commands::Windows { start, end, years } => run_windows(&start, &end, years),
        Commands::Status { output_dir } => run_status(&output_dir),
    }
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn run_collect(
    metadata: &str,
    config_path: Option<&Path>,
    output_dir: Option<PathBuf>,
    fail_fast: bool,
    today: Option<String>,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => CollectorConfig::from_file(path)?,
        None => CollectorConfig::default(),
    };
    if let Some(dir) = output_dir {
        config.output.dir = dir;
    }
    if fail_fast {
        config.failure_policy = FailurePolicy::FailFast;
    }

    let clock: Arc<dyn Clock> = match today.as_deref() {
        Some(s) => Arc::new(FixedClock(
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .with_context(|| format!("invalid --today '{s}', expected YYYY-MM-DD"))?,
        )),
        None => Arc::new(SystemClock),
    };

    let transport = HttpTransport::new(&config.http)?;
    let fetcher = Fetcher::new(Arc::new(transport), config.retry.policy());

    let table = load_metadata(&fetcher, metadata)
        .with_context(|| format!("failed to load metadata from {metadata}"))?;
    if table.requests.is_empty() {
        bail!("metadata table {metadata} lists no recognized series");
    }

    let store = FrameStore::new(&config.output.dir);
    let min_date = config.output.min_date;
    let collector = Collector::new(fetcher, config, clock);
    let report = collector.run(&table.requests, &LogProgress)?;

    let frames = harmonize(&report.tables(), min_date);
    let written = store.write_all(&frames)?;

    println!("Collected: {}", report.collected());
    println!("Skipped:   {}", report.skipped);
    println!("Unrecognized metadata rows: {}", table.unrecognized);
    println!("Failed:    {}", report.failures.len());
    println!();
    for meta in &written {
        println!(
            "{:<12} {:>6} rows {:>4} columns  {} to {}",
            meta.frequency.label(),
            meta.row_count,
            meta.columns.len(),
            meta.start_date,
            meta.end_date
        );
    }

    if !report.all_succeeded() {
        for failure in &report.failures {
            eprintln!("Error: {failure}");
        }
        std::process::exit(1);
    }

    Ok(())
}

fn run_windows(start: &str, end: &str, years: u32) -> Result<()> {
    let start = parse_br(start).with_context(|| format!("invalid --start '{start}'"))?;
    let end = parse_br(end).with_context(|| format!("invalid --end '{end}'"))?;

    let windows = split_date_range(start, end, years);
    if windows.is_empty() {
        println!(
            "No windows: {} is not before {}",
            format_br(start),
            format_br(end)
        );
        return Ok(());
    }
    for (i, window) in windows.iter().enumerate() {
        println!("{:>3}  {window}", i + 1);
    }
    Ok(())
}

fn run_status(output_dir: &Path) -> Result<()> {
    if !output_dir.exists() {
        println!("Output directory does not exist: {}", output_dir.display());
        return Ok(());
    }

    let store = FrameStore::new(output_dir);
    println!("Output: {}", output_dir.display());
    println!();
    println!(
        "{:<12} {:<25} {:>8} {:>8}  {}",
        "Frequency", "Date Range", "Rows", "Columns", "Hash"
    );
    println!("{}", "-".repeat(72));
    for status in store.status() {
        match &status.meta {
            Some(meta) => println!(
                "{:<12} {:<25} {:>8} {:>8}  {}",
                status.frequency.label(),
                format!("{} to {}", meta.start_date, meta.end_date),
                meta.row_count,
                meta.columns.len(),
                meta.data_hash.get(..12).unwrap_or(&meta.data_hash)
            ),
            None => println!("{:<12} (not stored)", status.frequency.label()),
        }
    }
    Ok(())
}
