// Copyright 2026 trend-snapshot contributors
// SPDX-License-Identifier: MIT

//! trend-snapshot — entry point.
//!
//! Prints the path of the written snapshot on stdout and always exits 0.

use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::Parser;

use trend_snapshot::{ChromiumLauncher, FetcherConfig, TrendFetcher};

#[derive(Parser)]
#[command(
    name = "trend-snapshot",
    about = "Snapshot a trending-topics page into a dated JSON file",
    version
)]
struct Cli {
    /// Directory the snapshot is written to.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Trends page to load.
    #[arg(long)]
    url: Option<String>,

    /// Chromium executable tried before searching PATH.
    #[arg(long = "chromium")]
    chromium_path: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    /// Parse the command line. A malformed one is reported and ignored so
    /// the run still happens with defaults.
    fn parse_lenient() -> Self {
        match Cli::try_parse() {
            Ok(cli) => cli,
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                e.exit()
            }
            Err(e) => {
                let _ = e.print();
                eprintln!("  continuing with default settings");
                Cli::parse_from(["trend-snapshot"])
            }
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse_lenient();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("trend-snapshot v{}", env!("CARGO_PKG_VERSION"));

    let config = FetcherConfig::with_overrides(cli.output_dir, cli.url, cli.chromium_path);
    let fetcher = TrendFetcher::new(config, ChromiumLauncher);
    let path = fetcher.run().await;

    println!("{}", path.display());
}
