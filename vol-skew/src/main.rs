//! Volatility skew viewer CLI.
//!
//! # Usage
//!
//! ```bash
//! # List selectable expirations (scans the configured table)
//! vol-skew expirations --endpoint http://localhost:8000
//!
//! # Show the default expiration from captured scan responses
//! vol-skew show --export-dir data/scan
//!
//! # Show one expiration as JSON
//! vol-skew show --expiration 2025-03-21 --format json
//!
//! # Normalization counts
//! vol-skew summary --config config/default.toml
//! ```

use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use vol_skew::data::{PageProgress, ScanKey, ScanPage};
use vol_skew::presentation::SelectorSpec;
use vol_skew::{
    AppConfig, DynamoScanSource, JsonSink, Normalizer, PresentationSink, RecordSource,
    ScanExportSource, SkewSnapshot, SkewView, SourceError, TextSink,
};

#[derive(Parser)]
#[command(name = "vol-skew")]
#[command(about = "Implied volatility skew curves by expiration")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory of captured scan responses (overrides the endpoint)
    #[arg(long, global = true)]
    export_dir: Option<PathBuf>,

    /// Store endpoint, e.g. http://localhost:8000
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Table to scan
    #[arg(long, global = true)]
    table: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List selectable expirations and the default selection
    Expirations,

    /// Render the skew view for one or all expirations
    Show {
        /// Expiration label (YYYY-MM-DD); defaults to the earliest
        #[arg(short, long)]
        expiration: Option<String>,

        /// Render every expiration
        #[arg(long, conflicts_with = "expiration")]
        all: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Table page to print (text format, 1-based)
        #[arg(long, default_value_t = 1)]
        page: usize,
    },

    /// Print normalization counts for the scanned records
    Summary,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Either configured source.
enum Source {
    Dynamo(DynamoScanSource),
    Export(ScanExportSource),
}

impl RecordSource for Source {
    async fn scan_page(&mut self, start_key: Option<&ScanKey>) -> Result<ScanPage, SourceError> {
        match self {
            Source::Dynamo(s) => s.scan_page(start_key).await,
            Source::Export(s) => s.scan_page(start_key).await,
        }
    }
}

fn open_source(config: &AppConfig) -> Result<Source> {
    let source = &config.source;
    match &source.export_dir {
        Some(dir) => {
            let export = ScanExportSource::from_dir(dir)
                .with_context(|| format!("Failed to read scan export {}", dir.display()))?;
            Ok(Source::Export(export))
        }
        None => {
            let dynamo =
                DynamoScanSource::new(&source.table, &source.region, source.endpoint.as_deref())
                    .with_page_limit(source.page_limit);
            info!("Scanning {} at {}", source.table, dynamo.endpoint());
            Ok(Source::Dynamo(dynamo))
        }
    }
}

async fn load_snapshot(config: &AppConfig) -> Result<SkewSnapshot> {
    let mut source = open_source(config)?;
    let normalizer = Normalizer::new(config.schema.clone());

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner} {msg}")?);
    spinner.set_message("Scanning...");

    let snapshot = SkewSnapshot::load_with(&mut source, &normalizer, |p: &PageProgress| {
        spinner.set_message(format!("{} records in {} pages", p.total_items, p.pages));
        spinner.tick();
    })
    .await;
    spinner.finish_and_clear();

    snapshot.context("Initial scan failed")
}

fn present(view: &SkewView, format: OutputFormat, page: usize) -> Result<()> {
    let stdout = io::stdout().lock();
    match format {
        OutputFormat::Text => TextSink::new(stdout).with_page(page).present(view)?,
        OutputFormat::Json => JsonSink::new(stdout).present(view)?,
    }
    Ok(())
}

fn cmd_expirations(snapshot: &SkewSnapshot) {
    let index = snapshot.expirations();
    if index.is_empty() {
        println!("No expirations available.");
        return;
    }
    for label in index.available_expirations() {
        println!("{}  ({} records)", label, index.record_count(label));
    }
    println!();
    println!("Default: {}", index.select_default().unwrap_or("-"));
}

fn cmd_show(
    snapshot: &SkewSnapshot,
    config: &AppConfig,
    expiration: Option<String>,
    all: bool,
    format: OutputFormat,
    page: usize,
) -> Result<()> {
    let page = page.saturating_sub(1);
    let index = snapshot.expirations();

    if all {
        let options = index.available_expirations().to_vec();
        for set in snapshot.build_all() {
            let selector = SelectorSpec {
                options: options.clone(),
                selected: Some(set.expiration.clone()),
            };
            let view = SkewView::from_curve_set(&set, selector, &config.presentation);
            present(&view, format, page)?;
        }
        return Ok(());
    }

    if let Some(label) = &expiration {
        if !index.contains(label) {
            bail!(
                "Unknown expiration {}; available: {}",
                label,
                index.available_expirations().join(", ")
            );
        }
    }

    let view = SkewView::render(snapshot, expiration.as_deref(), &config.presentation);
    if view.chart.series.is_empty() {
        warn!("No call or put points for the selected expiration");
    }
    present(&view, format, page)
}

fn cmd_summary(snapshot: &SkewSnapshot) {
    let report = snapshot.report();
    println!("Loaded at:           {}", snapshot.loaded_at().format("%Y-%m-%d %H:%M:%S UTC"));
    println!("Records scanned:     {}", report.scanned);
    println!("Options kept:        {}", report.kept);
    println!("Futures dropped:     {}", report.futures);
    println!("Unclassified:        {}", report.unclassified);
    println!("Missing strike:      {}", report.missing_strike);
    println!("Missing price:       {}", report.missing_price);
    println!("Missing vol:         {}", report.missing_vol);
    println!("Missing expiration:  {}", report.missing_expiration);
    println!("Unknown option type: {}", report.unknown_type);
    println!("Expirations:         {}", snapshot.expirations().len());
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("Invalid configuration")?;
    if let Some(dir) = cli.export_dir {
        config.source.export_dir = Some(dir);
    }
    if let Some(endpoint) = cli.endpoint {
        config.source.endpoint = Some(endpoint);
    }
    if let Some(table) = cli.table {
        config.source.table = table;
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(config.logging.filter.parse()?),
        )
        .init();

    let snapshot = load_snapshot(&config).await?;

    match cli.command {
        Commands::Expirations => cmd_expirations(&snapshot),
        Commands::Show {
            expiration,
            all,
            format,
            page,
        } => cmd_show(&snapshot, &config, expiration, all, format, page)?,
        Commands::Summary => cmd_summary(&snapshot),
    }

    Ok(())
}
