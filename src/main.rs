//! CLI entry point for the conversion chart tool.
//!
//! Loads an A/B-test dataset from a file or URL, aggregates it into
//! conversion-rate chart points and writes them as JSON, CSV or a text table.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use conversion_chart::aggregate::types::{ChartData, Granularity, RawData};
use conversion_chart::aggregate::variations::{find_key_collisions, find_reserved_keys};
use conversion_chart::dashboard::{Dashboard, Selection};
use conversion_chart::{
    fetch::load_source,
    output::{print_json, print_pretty, render_table, to_json, write_points_csv, write_points_csv_to},
    parser::parse_dataset,
    stats::DatasetSummary,
};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const DATA_ENV: &str = "CONVERSION_CHART_DATA";

#[derive(Parser)]
#[command(name = "conversion_chart")]
#[command(about = "Conversion-rate charts for A/B test datasets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
    Table,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate a dataset into chart points
    Chart {
        /// Path or URL of the dataset (defaults to $CONVERSION_CHART_DATA)
        #[arg(short, long, value_name = "FILE_OR_URL")]
        input: Option<String>,

        /// Bucket size of the chart
        #[arg(short, long, value_enum, default_value_t = Granularity::Day)]
        granularity: Granularity,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// File to write instead of stdout
        #[arg(short, long)]
        output: Option<String>,

        /// Only include these variation keys (repeatable)
        #[arg(short = 'v', long = "variation", value_name = "KEY")]
        variations: Vec<String>,
    },
    /// List the resolved variations of a dataset
    Variations {
        /// Path or URL of the dataset (defaults to $CONVERSION_CHART_DATA)
        #[arg(short, long, value_name = "FILE_OR_URL")]
        input: Option<String>,
    },
    /// Print per-variation totals for a dataset
    Summary {
        /// Path or URL of the dataset (defaults to $CONVERSION_CHART_DATA)
        #[arg(short, long, value_name = "FILE_OR_URL")]
        input: Option<String>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/conversion_chart.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("conversion_chart.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Chart {
            input,
            granularity,
            format,
            output,
            variations,
        } => {
            let raw = load_dataset(input)?;
            let mut dashboard = Dashboard::new(raw);

            let selection = if variations.is_empty() {
                Selection::all(dashboard.variations())
            } else {
                Selection::only(dashboard.variations(), variations.iter().map(String::as_str))
            };
            info!(
                %granularity,
                selection = %selection.describe(dashboard.variations()),
                "Building chart"
            );

            let data = selection.filter(dashboard.chart_data(granularity));
            print_pretty(&data);
            write_chart(&data, format, output.as_deref())?;
        }
        Commands::Variations { input } => {
            let raw = load_dataset(input)?;
            let dashboard = Dashboard::new(raw);

            for v in dashboard.variations() {
                println!("{}\t{}\t{}\t{}", v.id, v.key, v.color, v.name);
            }

            for collision in find_key_collisions(dashboard.variations()) {
                warn!(
                    key = %collision.key,
                    names = ?collision.names,
                    "Variations share a chart key"
                );
            }
            for clash in find_reserved_keys(dashboard.variations()) {
                warn!(
                    key = %clash.key,
                    names = ?clash.names,
                    "Variation key shadows a chart point field"
                );
            }
        }
        Commands::Summary { input } => {
            let raw = load_dataset(input)?;
            let summary = DatasetSummary::from_raw(&raw);

            info!(
                rows = summary.rows,
                invalid_dates = summary.invalid_dates,
                leaders = ?summary.leaders(),
                "Dataset summary"
            );
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}

/// Resolves the dataset source from the flag or the environment, then loads and parses it.
#[tracing::instrument(skip_all)]
fn load_dataset(input: Option<String>) -> Result<RawData> {
    let source = match input.or_else(|| std::env::var(DATA_ENV).ok()) {
        Some(source) => source,
        None => bail!("No dataset given: pass --input or set {DATA_ENV}"),
    };

    let bytes = load_source(&source)?;
    let raw = parse_dataset(&bytes).with_context(|| format!("Failed to parse '{source}'"))?;

    info!(
        source = %source,
        variations = raw.variations.len(),
        rows = raw.data.len(),
        "Dataset loaded"
    );
    Ok(raw)
}

fn write_chart(data: &ChartData, format: OutputFormat, output: Option<&str>) -> Result<()> {
    match (format, output) {
        (OutputFormat::Json, Some(path)) => {
            std::fs::write(path, to_json(data)?).with_context(|| format!("Failed to write '{path}'"))?;
            info!(path, "JSON written");
        }
        (OutputFormat::Json, None) => print_json(data, &mut std::io::stdout().lock())?,
        (OutputFormat::Csv, Some(path)) => write_points_csv(path, data)?,
        (OutputFormat::Csv, None) => write_points_csv_to(std::io::stdout().lock(), data)?,
        (OutputFormat::Table, Some(path)) => {
            std::fs::write(path, render_table(data)).with_context(|| format!("Failed to write '{path}'"))?;
            info!(path, "Table written");
        }
        (OutputFormat::Table, None) => print!("{}", render_table(data)),
    }
    Ok(())
}
