//! Concurrent dataset orchestration

use crate::collector::config::{
    default_raw_data_dir, retry_delay, DEFAULT_CONCURRENCY, DEFAULT_MAX_RETRIES,
    DEFAULT_RETRY_DELAY_MS, MAX_CONCURRENCY,
};
use crate::collector::{
    CollectError, CollectResult, DatasetError, DatasetExecutor, DatasetJob, JobOutcome,
};
use crate::config::CollectorConfig;
use crate::credentials::{CredentialSource, EnvCredentials};
use crate::fetcher::{ReqwestTransport, RetryingTransport, Transport};
use crate::output::{CsvTableSink, TableSink};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Runs every configured dataset with bounded concurrency
pub struct DatasetOrchestrator {
    data_dir: PathBuf,
    concurrency: usize,
    max_retries: u32,
    retry_delay: Duration,
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialSource>,
    sink: Arc<dyn TableSink>,
    show_progress: bool,
}

impl Default for DatasetOrchestrator {
    fn default() -> Self {
        Self::new(default_raw_data_dir())
    }
}

impl DatasetOrchestrator {
    /// Create an orchestrator writing under `data_dir`
    pub fn new<P: Into<PathBuf>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.into(),
            concurrency: DEFAULT_CONCURRENCY,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: retry_delay(DEFAULT_RETRY_DELAY_MS),
            transport: Arc::new(ReqwestTransport::default()),
            credentials: Arc::new(EnvCredentials),
            sink: Arc::new(CsvTableSink::new()),
            show_progress: false,
        }
    }

    /// Set the number of datasets in flight (clamped to `1..=32`)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, MAX_CONCURRENCY);
        self
    }

    /// Set total attempts per request
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the fixed delay between attempts
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Replace the HTTP transport
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// Replace the credential source
    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialSource>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Replace the table sink
    pub fn with_sink(mut self, sink: Arc<dyn TableSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Show a progress bar on stderr
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Output root
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Concurrency bound
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// One pending job per configured dataset, in configuration order
    pub fn jobs(&self, config: &CollectorConfig) -> Vec<DatasetJob> {
        config
            .apis()
            .iter()
            .flat_map(|api| {
                api.datasets.iter().map(move |descriptor| {
                    DatasetJob::new(api.endpoint.clone(), descriptor.clone(), &self.data_dir)
                })
            })
            .collect()
    }

    /// Run every dataset and fail if any of them failed.
    ///
    /// All tasks run to completion before the result is returned; datasets
    /// that succeeded keep their files.
    ///
    /// # Errors
    /// Returns [`CollectError::BatchFailed`] listing every failed dataset
    pub async fn run(&self, config: &CollectorConfig) -> CollectResult<BatchSummary> {
        self.run_all(config).await.into_result()
    }

    /// Run every dataset and report per-dataset results
    pub async fn run_all(&self, config: &CollectorConfig) -> BatchSummary {
        let started_at = Utc::now();
        let jobs = self.jobs(config);
        let total = jobs.len();

        info!(
            "Collecting {} datasets with concurrency {}",
            total, self.concurrency
        );

        let executor = self.executor();
        let progress = self.progress_bar(total);

        let mut results: Vec<(usize, String, CollectResult<JobOutcome>)> =
            stream::iter(jobs.into_iter().enumerate())
                .map(|(index, mut job)| {
                    let executor = &executor;
                    let progress = &progress;
                    async move {
                        let result = executor.execute(&mut job).await;
                        progress.inc(1);
                        (index, job.dataset_name().to_string(), result)
                    }
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;

        progress.finish_and_clear();
        results.sort_by_key(|(index, _, _)| *index);

        let mut outcomes = Vec::new();
        let mut failures = Vec::new();
        for (_, dataset, result) in results {
            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(source) => failures.push(DatasetError { dataset, source }),
            }
        }

        let summary = BatchSummary {
            started_at,
            finished_at: Utc::now(),
            total,
            outcomes,
            failures,
        };
        summary.log();
        summary
    }

    fn executor(&self) -> DatasetExecutor {
        let transport = RetryingTransport::new(self.transport.clone())
            .with_max_retries(self.max_retries)
            .with_base_delay(self.retry_delay)
            .with_credentials(self.credentials.clone());
        DatasetExecutor::new(transport).with_sink(self.sink.clone())
    }

    fn progress_bar(&self, total: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(total as u64);
        let style = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} datasets",
        )
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb
    }
}

/// Result of a batch run
#[derive(Debug)]
pub struct BatchSummary {
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the last task finished
    pub finished_at: DateTime<Utc>,
    total: usize,
    outcomes: Vec<JobOutcome>,
    failures: Vec<DatasetError>,
}

impl BatchSummary {
    /// Datasets in the batch
    pub fn total(&self) -> usize {
        self.total
    }

    /// Datasets written
    pub fn succeeded(&self) -> usize {
        self.outcomes.len()
    }

    /// Datasets that failed
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Completed datasets, in configuration order
    pub fn outcomes(&self) -> &[JobOutcome] {
        &self.outcomes
    }

    /// Failed datasets, in configuration order
    pub fn failures(&self) -> &[DatasetError] {
        &self.failures
    }

    /// Wall-clock duration of the run
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    /// `Ok(self)` when every dataset succeeded
    ///
    /// # Errors
    /// Returns [`CollectError::BatchFailed`] carrying every failure
    pub fn into_result(self) -> CollectResult<Self> {
        if self.failures.is_empty() {
            Ok(self)
        } else {
            Err(CollectError::BatchFailed {
                total: self.total,
                failures: self.failures,
            })
        }
    }

    fn log(&self) {
        let elapsed_secs = self.elapsed().num_milliseconds() as f64 / 1000.0;
        if self.failures.is_empty() {
            info!(
                "Collected {} datasets in {:.1}s",
                self.succeeded(),
                elapsed_secs
            );
        } else {
            warn!(
                "Collection finished with failures: {} succeeded, {} failed in {:.1}s",
                self.succeeded(),
                self.failed(),
                elapsed_secs
            );
        }
        for outcome in &self.outcomes {
            info!(
                dataset = %outcome.dataset,
                rows = outcome.rows,
                path = %outcome.output_path.display(),
                "Dataset written"
            );
        }
    }
}
