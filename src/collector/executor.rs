//! Single-dataset executor

use crate::collector::{CollectResult, DatasetJob, JobOutcome, JobStatus};
use crate::decode::decode;
use crate::fetcher::RetryingTransport;
use crate::normalize::{normalize, DatasetContext};
use crate::output::{CsvTableSink, TableSink};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Runs one [`DatasetJob`]: fetch, decode, normalize, save
#[derive(Clone)]
pub struct DatasetExecutor {
    transport: RetryingTransport,
    sink: Arc<dyn TableSink>,
}

impl DatasetExecutor {
    /// Create an executor writing CSV files
    pub fn new(transport: RetryingTransport) -> Self {
        Self {
            transport,
            sink: Arc::new(CsvTableSink::new()),
        }
    }

    /// Replace the table sink
    pub fn with_sink(mut self, sink: Arc<dyn TableSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Execute the job, updating its status.
    ///
    /// # Errors
    /// Returns the first failing stage's error; nothing is written in that case.
    pub async fn execute(&self, job: &mut DatasetJob) -> CollectResult<JobOutcome> {
        job.status = JobStatus::InProgress;
        info!(
            api = job.api_name(),
            dataset = job.dataset_name(),
            "Fetching {} data",
            job.dataset_name()
        );

        match self.run(job).await {
            Ok(outcome) => {
                job.status = JobStatus::Completed;
                Ok(outcome)
            }
            Err(e) => {
                job.status = JobStatus::Failed;
                error!(dataset = job.dataset_name(), "Dataset failed: {}", e);
                Err(e)
            }
        }
    }

    async fn run(&self, job: &DatasetJob) -> CollectResult<JobOutcome> {
        let descriptor = &job.descriptor;

        let response = self
            .transport
            .execute(
                &job.endpoint,
                &descriptor.payload_template,
                descriptor.request_method,
                &descriptor.dataset_name,
            )
            .await?;

        let payload = decode(&response.body)?;
        debug!(
            dataset = %descriptor.dataset_name,
            format = payload.format_name(),
            content_type = ?response.content_type,
            "Decoded response"
        );

        let ctx = DatasetContext {
            dataset_name: &descriptor.dataset_name,
            stamp_series_id: descriptor.stamp_series_id,
        };
        let table = normalize(
            descriptor.provider_kind,
            &payload,
            &descriptor.required_fields,
            &ctx,
        )?;

        self.sink.save(&table, &job.output_path)?;

        Ok(JobOutcome {
            dataset: descriptor.dataset_name.clone(),
            api: job.api_name().to_string(),
            rows: table.len(),
            output_path: job.output_path.clone(),
        })
    }
}
