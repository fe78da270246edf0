//! HTTP transport and retry loop

use crate::credentials::CredentialError;
use crate::RequestMethod;
use async_trait::async_trait;
use serde_json::{Map, Value};

pub mod http;
pub mod retry;
pub mod retry_formatter;
pub mod shared_resources;

pub use http::ReqwestTransport;
pub use retry::RetryingTransport;

use retry_formatter::RetryErrorType;

/// Fetcher errors
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Credential missing; raised before any network attempt
    #[error("configuration error: {0}")]
    Credential(#[from] CredentialError),

    /// Every attempt failed
    #[error("API request failed after {attempts} attempts (last status: {last})")]
    RequestFailed {
        /// Number of attempts made
        attempts: u32,
        /// Failure observed on the final attempt
        last: AttemptFailure,
    },
}

/// Result type for fetcher operations
pub type FetchResult<T> = Result<T, FetchError>;

/// Why a single attempt failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    /// Non-2xx HTTP status
    Status(u16),
    /// Connection, TLS or timeout failure
    Network(String),
}

impl std::fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptFailure::Status(code) => write!(f, "{code}"),
            AttemptFailure::Network(_) => write!(f, "network error"),
        }
    }
}

/// Transport-level failure before any HTTP status was received
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct SendError {
    /// Classification used for log wording
    pub error_type: RetryErrorType,
    /// Underlying error text
    pub message: String,
}

impl SendError {
    /// Create a send error
    pub fn new(error_type: RetryErrorType, message: impl Into<String>) -> Self {
        Self {
            error_type,
            message: message.into(),
        }
    }
}

/// A fully prepared request: credential already merged into the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    /// HTTP method
    pub method: RequestMethod,
    /// Endpoint URL
    pub url: String,
    /// Query parameters (GET) or JSON body (POST)
    pub payload: Map<String, Value>,
}

impl OutboundRequest {
    /// Payload rendered as query parameters.
    ///
    /// Strings are sent verbatim, numbers and booleans rendered, arrays
    /// comma-joined, nulls skipped.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.payload
            .iter()
            .filter_map(|(key, value)| query_value(value).map(|v| (key.clone(), v)))
            .collect()
    }

    /// Payload keys, for logging without exposing values
    pub fn parameter_names(&self) -> Vec<&str> {
        self.payload.keys().map(String::as_str).collect()
    }
}

fn query_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(query_value)
                .collect::<Vec<_>>()
                .join(","),
        ),
        other => Some(other.to_string()),
    }
}

/// Raw HTTP response, discarded once decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// Declared `Content-Type`, if any
    pub content_type: Option<String>,
    /// Response body
    pub body: String,
}

impl RawResponse {
    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one HTTP request. No retries at this level.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and return whatever status the server answered with
    async fn send(&self, request: &OutboundRequest) -> Result<RawResponse, SendError>;
}
