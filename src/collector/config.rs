//! Collection defaults

use std::path::PathBuf;
use std::time::Duration;

/// Total attempts per request, including the first.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Fixed delay between attempts in milliseconds (not exponential).
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

/// Dataset tasks in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Upper bound accepted for `--concurrency`.
pub const MAX_CONCURRENCY: usize = 32;

/// Root directory for raw per-dataset CSV files.
pub const DEFAULT_RAW_DATA_DIR: &str = "data/raw";

/// Default configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Delay before the next attempt. Fixed: the attempt number does not scale it.
pub fn retry_delay(base_delay_ms: u64) -> Duration {
    Duration::from_millis(base_delay_ms)
}

/// Default raw data directory as a path
pub fn default_raw_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_RAW_DATA_DIR)
}
