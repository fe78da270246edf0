//! Dataset collection
//!
//! Turns a loaded [`CollectorConfig`](crate::config::CollectorConfig) into a
//! batch of independent fetch → decode → normalize → save tasks.
//!
//! 1. **Jobs**: one [`job::DatasetJob`] per configured dataset, with a fixed output path
//! 2. **Execution**: [`executor::DatasetExecutor`] runs a single job end to end
//! 3. **Orchestration**: [`orchestrator::DatasetOrchestrator`] runs every job with bounded
//!    concurrency and waits for all of them before reporting
//!
//! A failed dataset never cancels its siblings. Files written by datasets that
//! succeeded stay on disk when others fail.

pub mod config;
pub mod executor;
pub mod job;
pub mod orchestrator;

pub use executor::DatasetExecutor;
pub use job::{DatasetJob, JobOutcome, JobStatus};
pub use orchestrator::{BatchSummary, DatasetOrchestrator};

use crate::decode::DecodeError;
use crate::fetcher::FetchError;
use crate::normalize::NormalizeError;
use crate::output::OutputError;

/// Collection errors
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    /// Transport or credential failure
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Response body could not be decoded
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Decoded response did not have the expected shape
    #[error("normalize error: {0}")]
    Normalize(#[from] NormalizeError),

    /// Table could not be written
    #[error("output error: {0}")]
    Output(#[from] OutputError),

    /// One or more datasets in a batch failed
    #[error("{} of {total} datasets failed: {}", .failures.len(), describe_failures(.failures))]
    BatchFailed {
        /// Datasets in the batch
        total: usize,
        /// Every failure, in configuration order
        failures: Vec<DatasetError>,
    },
}

/// Result type for collection
pub type CollectResult<T> = Result<T, CollectError>;

/// A collection error tagged with the dataset it belongs to
#[derive(Debug, thiserror::Error)]
#[error("{dataset}: {source}")]
pub struct DatasetError {
    /// Dataset name as configured
    pub dataset: String,
    /// Underlying failure
    #[source]
    pub source: CollectError,
}

fn describe_failures(failures: &[DatasetError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
