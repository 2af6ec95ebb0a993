//! CLI entry point for the bus monitor.
//!
//! Provides subcommands for collecting live vehicle positions, flagging speeding vehicles and
//! checking punctuality against stop timetables.

use anyhow::{Context, Result, bail};
use bus_monitor::analysis::{punctuality, speed};
use bus_monitor::config::AnalysisConfig;
use bus_monitor::fetch::BasicClient;
use bus_monitor::fetch::auth::UrlParam;
use bus_monitor::fetch::positions::{DEFAULT_BASE_URL, VehicleKind, fetch_positions, positions_url};
use bus_monitor::output::{
    append_records, load_observations, load_schedules, print_json, write_report, write_speeding,
};
use clap::{Parser, Subcommand};
use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::Path;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "bus_monitor")]
#[command(about = "Collects live transit positions and analyses speeding and punctuality", long_about = None)]
struct Cli {
    /// JSON file with analysis settings (speed limit, punctuality window, stop radius)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the live position endpoint and append every snapshot to a CSV file
    Collect {
        /// CSV file to create; refuses to overwrite an existing file
        #[arg(short, long, default_value = "bus_data.csv")]
        output: String,

        /// Number of snapshots to download
        #[arg(short = 'n', long, default_value_t = 1)]
        samples: usize,

        /// Seconds to wait between snapshots
        #[arg(short = 'r', long, default_value_t = 60)]
        interval: u64,

        /// Fleet to poll
        #[arg(short, long, value_enum, default_value_t = VehicleKind::Bus)]
        kind: VehicleKind,

        /// API base URL
        #[arg(long, default_value = DEFAULT_BASE_URL)]
        base_url: String,
    },
    /// Flag observations whose average speed exceeds the limit
    Speeding {
        /// Position CSV produced by `collect`
        #[arg(value_name = "POSITIONS")]
        input: String,

        /// Speed limit in km/h (overrides the config file)
        #[arg(short, long)]
        limit: Option<f64>,

        /// CSV file to write flagged rows to
        #[arg(short, long, default_value = "speeding.csv")]
        output: String,
    },
    /// Classify scheduled arrivals as punctual or late
    Punctuality {
        /// Position CSV produced by `collect`
        #[arg(value_name = "POSITIONS")]
        positions: String,

        /// JSON file with stop timetables
        #[arg(short, long)]
        schedule: String,

        /// JSON file to write the report to
        #[arg(short, long, default_value = "punctuality.json")]
        output: String,

        /// Also log the full report
        #[arg(long, default_value_t = false)]
        print: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/bus_monitor.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("bus_monitor.log"));

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
    let config = AnalysisConfig::load_or_default(cli.config.as_deref())?;
    debug!(?config, "Analysis config loaded");

    match cli.command {
        Commands::Collect {
            output,
            samples,
            interval,
            kind,
            base_url,
        } => {
            collect(&output, samples, interval, kind, &base_url).await?;
        }
        Commands::Speeding {
            input,
            limit,
            output,
        } => {
            let limit = limit.unwrap_or(config.speed_limit_kmh);
            let observations = load_observations(&input)?;
            let flagged = speed::speeding(&observations, limit)
                .with_context(|| format!("Speed analysis of '{input}' failed"))?;

            let vehicles: HashSet<&str> = flagged.iter().map(|r| r.vehicle.as_str()).collect();
            let top_speed = flagged.iter().map(|r| r.avg_speed).fold(0.0, f64::max);
            info!(
                rows = observations.len(),
                flagged = flagged.len(),
                vehicles = vehicles.len(),
                top_speed_kmh = top_speed,
                limit_kmh = limit,
                "Speeding analysis complete"
            );

            write_speeding(&output, &flagged)?;
            info!(output = %output, "Speeding rows written");
        }
        Commands::Punctuality {
            positions,
            schedule,
            output,
            print,
        } => {
            let observations = load_observations(&positions)?;
            let stops = load_schedules(&schedule)?;
            let report = punctuality::classify(&observations, &stops, &config.punctuality)
                .context("Punctuality analysis failed")?;

            info!(
                punctual = report.punctual.len(),
                late = report.late.len(),
                "Punctuality analysis complete"
            );
            if print {
                print_json(&report)?;
            }

            write_report(&output, &report)?;
            info!(output = %output, "Punctuality report written");
        }
    }

    Ok(())
}

/// Downloads `samples` position snapshots, `interval` seconds apart, appending each to `output`.
///
/// A failed download or parse only loses that snapshot.
#[tracing::instrument(skip(base_url))]
async fn collect(
    output: &str,
    samples: usize,
    interval: u64,
    kind: VehicleKind,
    base_url: &str,
) -> Result<()> {
    if Path::new(output).exists() {
        bail!("Such file: '{output}' already exists. Please choose another name.");
    }

    let api_key = std::env::var("WARSAW_API_KEY").context("WARSAW_API_KEY must be set")?;
    let client = UrlParam::api_key(BasicClient::new()?, api_key);
    let url = positions_url(base_url, kind);

    for sample in 1..=samples {
        match fetch_positions(&client, &url).await {
            Ok(positions) if positions.is_empty() => {
                warn!(sample, "Snapshot contained no vehicles");
            }
            Ok(positions) => {
                if let Err(e) = append_records(output, &positions) {
                    error!(error = %e, "Failed to write snapshot");
                } else {
                    debug!(vehicles = positions.len(), "Snapshot written");
                }
            }
            Err(e) => {
                error!(sample, error = %e, "Snapshot download failed");
            }
        }

        info!(remaining = samples - sample, "Snapshots until collection is complete");

        if sample < samples {
            tokio::time::sleep(tokio::time::Duration::from_secs(interval)).await;
        }
    }

    info!(output, "Collection complete");
    Ok(())
}
