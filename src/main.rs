use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

use cell_locator::api::estimate_from_records;
use cell_locator::processing::read_records;
use cell_locator::utils::{ConfigurationManager, ParameterOverrides};

/// Estimate cell transmitter positions from logged signal readings
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON file of log batches ({timestamp, lat, lon, cells: [...]}, or an array of them)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Estimation method: wls, robust, accum or centroid
    #[arg(long, value_name = "METHOD")]
    method: Option<String>,

    /// Path-loss exponent
    #[arg(long, value_name = "N")]
    ple: Option<f64>,

    /// RSSI at the reference distance (dBm)
    #[arg(long, value_name = "DBM", allow_hyphen_values = true)]
    ref_rssi: Option<f64>,

    /// Reference distance (m)
    #[arg(long, value_name = "M")]
    ref_dist: Option<f64>,

    /// Clustering radius for the accum method (m)
    #[arg(long, value_name = "M")]
    bandwidth: Option<f64>,

    /// Attach per-observation circles and the method used to each result
    #[arg(long)]
    debug: bool,

    /// Only use records at or after this unix time (s)
    #[arg(long, value_name = "UNIX_SECONDS")]
    since: Option<i64>,

    /// Only use records before this unix time (s)
    #[arg(long, value_name = "UNIX_SECONDS")]
    until: Option<i64>,

    /// JSON parameter file applied before the flags above
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Pretty-print the output
    #[arg(long)]
    pretty: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> ParameterOverrides {
        ParameterOverrides {
            method: self.method.clone(),
            ple: self.ple,
            ref_rssi: self.ref_rssi,
            ref_dist: self.ref_dist,
            bandwidth_m: self.bandwidth,
            debug: self.debug.then_some(true),
            since: self.since,
            until: self.until,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut manager = match &cli.config {
        Some(path) => ConfigurationManager::from_file(path)?,
        None => ConfigurationManager::new(),
    };
    for change in manager.apply_overrides(&cli.overrides())? {
        info!("override {}", change);
    }
    let params = manager.into_params();

    let records = read_records(&cli.input)?;
    info!("Read {} log records from {}", records.len(), cli.input.display());

    let batch = estimate_from_records(params, &records)?;
    if !batch.grouping.skipped.is_empty() {
        info!(
            "Skipped {} records, removed {} duplicates, {} outside window",
            batch.grouping.skipped.len(),
            batch.grouping.duplicates_removed,
            batch.grouping.outside_window
        );
    }

    let output = if cli.pretty {
        serde_json::to_string_pretty(&batch.results)?
    } else {
        serde_json::to_string(&batch.results)?
    };
    println!("{}", output);
    Ok(())
}

fn init_logging(verbose: bool) {
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true);

    if verbose {
        subscriber.with_max_level(tracing::Level::DEBUG).init();
    } else {
        subscriber.with_max_level(tracing::Level::INFO).init();
    }
}
