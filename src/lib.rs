//! # Economic Data Collector Library
//!
//! Fetches time-series economic indicators (price indices, employment, GDP,
//! consumption, housing, retail sales, household income) from statistical-agency
//! HTTP APIs, normalizes each provider's response shape into a rectangular table
//! and writes one CSV file per dataset.
//!
//! ## Features
//!
//! - **Declarative datasets**: every (API, dataset) pair comes from a JSON configuration
//! - **Retrying transport**: bounded fixed-delay retries for network and HTTP failures
//! - **Provider normalizers**: BLS series, CES series, FRED JSON and FRED XML observations
//! - **Bounded concurrency**: datasets run as cooperative tasks with a configurable limit
//! - **Exact columns**: every table carries exactly the caller's `required_fields`
//!
//! ## Quick Start
//!
//! ```no_run
//! use econ_data_collector::collector::DatasetOrchestrator;
//! use econ_data_collector::config::CollectorConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CollectorConfig::load("config.json")?;
//! let summary = DatasetOrchestrator::new("data/raw").run(&config).await?;
//! println!("{} datasets written", summary.succeeded());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`credentials`] - Secret lookup from the process environment
//! - [`config`] - Configuration document, dataset descriptors and provider endpoints
//! - [`fetcher`] - HTTP transport and the retry loop
//! - [`decode`] - JSON / XML response decoding
//! - [`normalize`] - Provider-specific normalizers and the normalized table
//! - [`output`] - CSV table sink
//! - [`collector`] - Per-dataset tasks and the concurrent orchestrator
//! - [`cli`] - Command line entry point

#![warn(missing_docs)]
#![warn(clippy::all)]

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// CLI entry point
pub mod cli;

/// Dataset task execution and orchestration
pub mod collector;

/// Configuration loading
pub mod config;

/// Credential resolution
pub mod credentials;

/// Response decoding
pub mod decode;

/// HTTP transport with retries
pub mod fetcher;

/// Provider response normalizers
pub mod normalize;

/// Table writers
pub mod output;

pub use collector::DatasetOrchestrator;
pub use config::CollectorConfig;
pub use normalize::{Cell, NormalizedTable};

/// Which response normalizer handles a dataset.
///
/// Carried explicitly on every dataset instead of being guessed from the endpoint URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProviderKind {
    /// BLS timeseries API, `Results.series[0].data`
    Bls,
    /// BLS Current Employment Statistics; same shape, series ID stamped on every row
    Ces,
    /// FRED observations as JSON
    FredJson,
    /// FRED observations as XML
    FredXml,
}

impl ProviderKind {
    /// Payload field the provider expects the API key under.
    pub fn credential_field(&self) -> &'static str {
        match self {
            ProviderKind::Bls | ProviderKind::Ces => "registrationkey",
            ProviderKind::FredJson | ProviderKind::FredXml => "api_key",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProviderKind::Bls => "bls",
            ProviderKind::Ces => "ces",
            ProviderKind::FredJson => "fred_json",
            ProviderKind::FredXml => "fred_xml",
        };
        write!(f, "{s}")
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bls" => Ok(ProviderKind::Bls),
            "ces" => Ok(ProviderKind::Ces),
            "fred_json" | "fred" => Ok(ProviderKind::FredJson),
            "fred_xml" => Ok(ProviderKind::FredXml),
            _ => Err(format!(
                "Invalid provider kind: {s}. Valid options: bls, ces, fred_json, fred_xml"
            )),
        }
    }
}

impl TryFrom<String> for ProviderKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ProviderKind> for String {
    fn from(kind: ProviderKind) -> Self {
        kind.to_string()
    }
}

/// HTTP method used for a provider request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RequestMethod {
    /// Payload sent as query parameters
    Get,
    /// Payload sent as a JSON body
    #[default]
    Post,
}

impl std::fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
        };
        write!(f, "{s}")
    }
}

impl FromStr for RequestMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(RequestMethod::Get),
            "POST" => Ok(RequestMethod::Post),
            _ => Err(format!("Invalid request method: {s}. Valid options: GET, POST")),
        }
    }
}

impl TryFrom<String> for RequestMethod {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RequestMethod> for String {
    fn from(method: RequestMethod) -> Self {
        method.to_string()
    }
}
