//! Collector configuration
//!
//! The configuration document is a JSON object keyed by API name. Each API names
//! its endpoint, the environment variable holding its secret, the HTTP method and
//! the datasets to collect. Everything is validated and resolved here, once, so the
//! collector never has to sniff URLs or guess defaults while running.

use crate::{ProviderKind, RequestMethod};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("failed to read configuration {path}: {message}")]
    Read {
        /// File path
        path: String,
        /// Underlying IO error
        message: String,
    },

    /// Document is not valid JSON or has the wrong shape
    #[error("invalid configuration: {0}")]
    Parse(String),

    /// Required key absent
    #[error("missing '{key}' for {section}")]
    MissingKey {
        /// API or dataset the key belongs to
        section: String,
        /// Key name
        key: &'static str,
    },

    /// Key present with an unusable value
    #[error("invalid value for {section}: {message}")]
    InvalidValue {
        /// API or dataset the value belongs to
        section: String,
        /// What is wrong with it
        message: String,
    },

    /// Two datasets would write the same output file
    #[error("datasets '{first}' and '{second}' map to the same output file")]
    DuplicateDataset {
        /// Dataset declared first
        first: String,
        /// Dataset declared later
        second: String,
    },

    /// Nothing to collect
    #[error("configuration declares no datasets")]
    Empty,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Where and how to reach one external API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoint {
    /// API name as declared in the configuration (e.g. "BLS")
    pub api_name: String,
    /// Endpoint URL
    pub base_url: String,
    /// Environment variable holding the API key
    pub credential_env_var: String,
    /// Payload field the key is sent under
    pub credential_field_name: String,
}

/// One dataset to fetch, normalize and save.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetDescriptor {
    /// Dataset name as declared in the configuration (e.g. "CPI")
    pub dataset_name: String,
    /// Normalizer to use
    pub provider_kind: ProviderKind,
    /// HTTP method
    pub request_method: RequestMethod,
    /// Request parameters, in declaration order, without the credential
    pub payload_template: Map<String, Value>,
    /// Exact output columns
    pub required_fields: Vec<String>,
    /// Attach the series identifier to every row (BLS series only)
    pub stamp_series_id: bool,
}

impl DatasetDescriptor {
    /// Output file name: lower-cased dataset name with a `_data.csv` suffix
    pub fn output_file_name(&self) -> String {
        format!("{}_data.csv", self.dataset_name.to_lowercase())
    }
}

/// One API with its resolved endpoint and datasets
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// API name
    pub name: String,
    /// Shared endpoint descriptor
    pub endpoint: Arc<ProviderEndpoint>,
    /// Datasets served by this endpoint
    pub datasets: Vec<Arc<DatasetDescriptor>>,
}

/// Fully resolved collector configuration
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    apis: Vec<ApiConfig>,
}

#[derive(Debug, Deserialize)]
struct ApiSection {
    api_url: Option<String>,
    api_key_env_var: Option<String>,
    method: Option<RequestMethod>,
    credential_field: Option<String>,
    provider_kind: Option<ProviderKind>,
    datasets: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct DatasetSection {
    payload: Option<Map<String, Value>>,
    required_fields: Option<Vec<String>>,
    provider_kind: Option<ProviderKind>,
    #[serde(default)]
    stamp_series_id: bool,
}

impl CollectorConfig {
    /// Load and resolve a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        info!("Loading configuration: path={}", path.display());

        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        Self::from_json_str(&text)
    }

    /// Resolve a configuration from JSON text
    pub fn from_json_str(text: &str) -> ConfigResult<Self> {
        let root: Map<String, Value> =
            serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let mut apis = Vec::with_capacity(root.len());
        for (api_name, section) in root {
            apis.push(resolve_api(&api_name, section)?);
        }

        let config = Self { apis };
        config.validate()?;

        info!(
            apis = config.apis.len(),
            datasets = config.dataset_count(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Configured APIs in declaration order
    pub fn apis(&self) -> &[ApiConfig] {
        &self.apis
    }

    /// Total number of datasets across every API
    pub fn dataset_count(&self) -> usize {
        self.apis.iter().map(|api| api.datasets.len()).sum()
    }

    /// Look up a dataset by name
    pub fn dataset(&self, name: &str) -> Option<(&Arc<ProviderEndpoint>, &Arc<DatasetDescriptor>)> {
        self.apis.iter().find_map(|api| {
            api.datasets
                .iter()
                .find(|d| d.dataset_name == name)
                .map(|d| (&api.endpoint, d))
        })
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.dataset_count() == 0 {
            return Err(ConfigError::Empty);
        }

        let mut seen: HashMap<String, &str> = HashMap::new();
        for dataset in self.apis.iter().flat_map(|api| api.datasets.iter()) {
            let file = dataset.output_file_name();
            if let Some(first) = seen.insert(file, &dataset.dataset_name) {
                return Err(ConfigError::DuplicateDataset {
                    first: first.to_string(),
                    second: dataset.dataset_name.clone(),
                });
            }
        }

        Ok(())
    }
}

fn resolve_api(api_name: &str, section: Value) -> ConfigResult<ApiConfig> {
    let section_name = format!("API '{api_name}'");
    let section: ApiSection = serde_json::from_value(section).map_err(|e| {
        ConfigError::InvalidValue {
            section: section_name.clone(),
            message: e.to_string(),
        }
    })?;

    let base_url = section.api_url.ok_or_else(|| ConfigError::MissingKey {
        section: section_name.clone(),
        key: "api_url",
    })?;
    let credential_env_var = section.api_key_env_var.ok_or_else(|| ConfigError::MissingKey {
        section: section_name.clone(),
        key: "api_key_env_var",
    })?;
    let raw_datasets = section.datasets.ok_or_else(|| ConfigError::MissingKey {
        section: section_name.clone(),
        key: "datasets",
    })?;
    let method = section.method.unwrap_or_default();

    let mut datasets = Vec::with_capacity(raw_datasets.len());
    for (dataset_name, raw) in raw_datasets {
        let descriptor = resolve_dataset(&dataset_name, raw, method, section.provider_kind)?;
        debug!(
            api = api_name,
            dataset = %descriptor.dataset_name,
            kind = %descriptor.provider_kind,
            "Resolved dataset"
        );
        datasets.push(Arc::new(descriptor));
    }

    let credential_field_name = match section.credential_field {
        Some(field) if !field.trim().is_empty() => field,
        Some(_) => {
            return Err(ConfigError::InvalidValue {
                section: section_name,
                message: "credential_field cannot be empty".to_string(),
            })
        }
        None => derive_credential_field(&section_name, &datasets)?,
    };

    Ok(ApiConfig {
        name: api_name.to_string(),
        endpoint: Arc::new(ProviderEndpoint {
            api_name: api_name.to_string(),
            base_url,
            credential_env_var,
            credential_field_name,
        }),
        datasets,
    })
}

fn resolve_dataset(
    dataset_name: &str,
    raw: Value,
    method: RequestMethod,
    default_kind: Option<ProviderKind>,
) -> ConfigResult<DatasetDescriptor> {
    let section_name = format!("dataset '{dataset_name}'");
    let section: DatasetSection =
        serde_json::from_value(raw).map_err(|e| ConfigError::InvalidValue {
            section: section_name.clone(),
            message: e.to_string(),
        })?;

    let payload_template = section.payload.ok_or_else(|| ConfigError::MissingKey {
        section: section_name.clone(),
        key: "payload",
    })?;

    let required_fields = match section.required_fields {
        Some(fields) if !fields.is_empty() => fields,
        _ => {
            return Err(ConfigError::MissingKey {
                section: section_name,
                key: "required_fields",
            })
        }
    };

    let mut unique = std::collections::HashSet::new();
    if let Some(dup) = required_fields.iter().find(|f| !unique.insert(f.as_str())) {
        return Err(ConfigError::InvalidValue {
            section: section_name,
            message: format!("required field '{dup}' listed twice"),
        });
    }

    let provider_kind = section
        .provider_kind
        .or(default_kind)
        .ok_or_else(|| ConfigError::MissingKey {
            section: section_name.clone(),
            key: "provider_kind",
        })?;

    if section.stamp_series_id && provider_kind != ProviderKind::Bls {
        return Err(ConfigError::InvalidValue {
            section: section_name,
            message: format!("stamp_series_id only applies to bls datasets, not {provider_kind}"),
        });
    }

    Ok(DatasetDescriptor {
        dataset_name: dataset_name.to_string(),
        provider_kind,
        request_method: method,
        payload_template,
        required_fields,
        stamp_series_id: section.stamp_series_id,
    })
}

fn derive_credential_field(
    section_name: &str,
    datasets: &[Arc<DatasetDescriptor>],
) -> ConfigResult<String> {
    let mut fields = datasets.iter().map(|d| d.provider_kind.credential_field());
    let first = fields.next().ok_or_else(|| ConfigError::InvalidValue {
        section: section_name.to_string(),
        message: "datasets cannot be empty".to_string(),
    })?;

    if fields.any(|field| field != first) {
        return Err(ConfigError::InvalidValue {
            section: section_name.to_string(),
            message: "datasets mix provider families; set credential_field explicitly".to_string(),
        });
    }

    Ok(first.to_string())
}
