//! Collect command implementation

use crate::collector::config::{
    retry_delay, DEFAULT_CONCURRENCY, DEFAULT_CONFIG_PATH, DEFAULT_MAX_RETRIES,
    DEFAULT_RAW_DATA_DIR, DEFAULT_RETRY_DELAY_MS, MAX_CONCURRENCY,
};
use crate::collector::{BatchSummary, DatasetOrchestrator};
use crate::config::CollectorConfig;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use super::CliError;

/// Parse and validate concurrency value
fn parse_concurrency(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if value == 0 {
        return Err("concurrency must be at least 1".to_string());
    }
    if value > MAX_CONCURRENCY {
        return Err(format!(
            "concurrency {value} exceeds maximum of {MAX_CONCURRENCY}"
        ));
    }
    Ok(value)
}

/// Economic Data Collector CLI
#[derive(Parser, Debug)]
#[command(name = "econ-data-collector")]
#[command(about = "Collect economic indicator series into per-dataset CSV files", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file listing APIs and datasets
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Directory receiving one `<dataset>_data.csv` per dataset
    #[arg(long, default_value = DEFAULT_RAW_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Number of datasets fetched at once (default: 4, max: 32)
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY, value_parser = parse_concurrency)]
    pub concurrency: usize,

    /// Total attempts per request (default: 3, range: 1-20)
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES, value_parser = clap::value_parser!(u32).range(1..=20))]
    pub max_retries: u32,

    /// Fixed delay between attempts in milliseconds
    #[arg(long, default_value_t = DEFAULT_RETRY_DELAY_MS)]
    pub retry_delay_ms: u64,

    /// Disable the progress bar
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
}

impl Cli {
    /// Load the configuration and collect every dataset
    pub async fn execute(&self) -> Result<BatchSummary, CliError> {
        let config = CollectorConfig::load(&self.config)?;

        info!(
            "Writing {} datasets to {}",
            config.dataset_count(),
            self.data_dir.display()
        );

        let summary = self.orchestrator().run(&config).await?;
        print_summary(&summary);
        Ok(summary)
    }

    /// Orchestrator configured from the command line
    pub fn orchestrator(&self) -> DatasetOrchestrator {
        DatasetOrchestrator::new(self.data_dir.clone())
            .with_concurrency(self.concurrency)
            .with_max_retries(self.max_retries)
            .with_retry_delay(retry_delay(self.retry_delay_ms))
            .with_progress(!self.no_progress)
    }
}

fn print_summary(summary: &BatchSummary) {
    println!("\nCollection completed successfully!");
    for outcome in summary.outcomes() {
        println!(
            "{:<24} {:>6} rows  {}",
            outcome.dataset,
            outcome.rows,
            outcome.output_path.display()
        );
    }
}
