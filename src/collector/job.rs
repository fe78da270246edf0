//! Dataset jobs and status tracking

use crate::config::{DatasetDescriptor, ProviderEndpoint};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One fetch → decode → normalize → save task
#[derive(Debug, Clone)]
pub struct DatasetJob {
    /// Endpoint shared by every dataset of the same API
    pub endpoint: Arc<ProviderEndpoint>,
    /// What to request and how to read it
    pub descriptor: Arc<DatasetDescriptor>,
    /// Output CSV path
    pub output_path: PathBuf,
    /// Current job status
    pub status: JobStatus,
}

impl DatasetJob {
    /// Create a pending job writing under `data_dir`
    pub fn new(
        endpoint: Arc<ProviderEndpoint>,
        descriptor: Arc<DatasetDescriptor>,
        data_dir: &Path,
    ) -> Self {
        let output_path = data_dir.join(descriptor.output_file_name());
        Self {
            endpoint,
            descriptor,
            output_path,
            status: JobStatus::Pending,
        }
    }

    /// Dataset name as configured
    pub fn dataset_name(&self) -> &str {
        &self.descriptor.dataset_name
    }

    /// API name the dataset belongs to
    pub fn api_name(&self) -> &str {
        &self.endpoint.api_name
    }
}

/// Job execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum JobStatus {
    /// Job has not started yet
    #[default]
    Pending,
    /// Job is currently running
    InProgress,
    /// Table written
    Completed,
    /// Job failed with error
    Failed,
}

/// What a completed job produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobOutcome {
    /// Dataset name
    pub dataset: String,
    /// API name
    pub api: String,
    /// Rows written (header excluded)
    pub rows: usize,
    /// File written
    pub output_path: PathBuf,
}
