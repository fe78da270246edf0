//! Retry message formatting for the retrying transport.
//!
//! Classifies each failed attempt so log lines say *what* went wrong in plain
//! words, and builds the final failure summary with remediation hints.
//! Classification never changes the retry decision: every failure is retried
//! until the attempt bound is reached.

use reqwest::Error as ReqwestError;
use std::time::Duration;

/// Classification of a failed attempt for user messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryErrorType {
    /// Request or connect timeout
    NetworkTimeout,
    /// Connection refused, DNS failure, TLS handshake failure
    NetworkOffline,
    /// HTTP 429
    RateLimit,
    /// HTTP 5xx
    ServerError(u16),
    /// HTTP 401/403
    AuthFailed(u16),
    /// Other non-2xx statuses
    ClientError(u16),
    /// Anything else
    NetworkGeneric,
}

impl RetryErrorType {
    /// User-friendly description string used inside retry log messages.
    pub fn description(&self) -> &'static str {
        match self {
            Self::NetworkTimeout => "network timeout",
            Self::NetworkOffline => "connection failed",
            Self::RateLimit => "rate limit exceeded",
            Self::ServerError(code) => match code {
                500 => "internal server error",
                502 => "bad gateway",
                503 => "service unavailable",
                504 => "gateway timeout",
                _ => "server error",
            },
            Self::AuthFailed(code) => match code {
                401 => "authentication failed (401)",
                403 => "authentication failed (403)",
                _ => "authentication failed",
            },
            Self::ClientError(code) => match code {
                400 => "invalid request",
                404 => "resource not found",
                _ => "unexpected status",
            },
            Self::NetworkGeneric => "network error",
        }
    }

    /// Suggested remediation shown with the final failure.
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::NetworkTimeout => "Check your network connection and firewall settings",
            Self::NetworkOffline => "Verify internet connectivity, DNS resolution and TLS setup",
            Self::RateLimit => "The provider's daily query quota may be exhausted; try again later",
            Self::ServerError(_) => "The statistics service may be experiencing issues, try again later",
            Self::AuthFailed(_) => "Verify the API key in your environment or .env file",
            Self::ClientError(_) => "Review the dataset payload (series IDs, years, file_type)",
            Self::NetworkGeneric => "Check network connectivity and try again",
        }
    }
}

/// Context for formatting retry messages.
#[derive(Debug, Clone)]
pub struct RetryContext {
    /// Current attempt number (1-based)
    pub attempt: u32,
    /// Maximum number of attempts configured
    pub max_attempts: u32,
    /// Type of error that triggered the retry
    pub error_type: RetryErrorType,
    /// Delay until the next attempt
    pub delay: Duration,
    /// Dataset being fetched (e.g., "CPI")
    pub dataset: String,
    /// Original error message for details
    pub error_message: String,
    /// URL that failed
    pub endpoint: String,
}

impl RetryContext {
    /// Convenience constructor used by the retry loop.
    pub fn new(
        attempt: u32,
        max_attempts: u32,
        error_type: RetryErrorType,
        delay: Duration,
        dataset: impl Into<String>,
        error_message: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            attempt,
            max_attempts,
            error_type,
            delay,
            dataset: dataset.into(),
            error_message: error_message.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Format standardized retry message with attempt counters and context.
    pub fn format_retry(&self) -> String {
        let mut message = format!(
            "Retrying (attempt {}/{}) after {} - waiting {:.1} seconds...",
            self.attempt + 1,
            self.max_attempts,
            self.error_type.description(),
            self.delay.as_secs_f64()
        );
        append_dataset(&mut message, &self.dataset);
        message
    }

    /// Format retry success message when a previous attempt eventually works.
    pub fn format_success(&self) -> String {
        let mut message = format!(
            "Retry attempt {}/{} succeeded",
            self.attempt, self.max_attempts
        );
        append_dataset(&mut message, &self.dataset);
        message
    }

    /// Format final failure summary with actionable suggestions.
    pub fn format_failure(&self) -> String {
        let dataset = if self.dataset.is_empty() {
            "unknown"
        } else {
            &self.dataset
        };

        let mut lines = vec![
            format!("[FAILED] Request failed after {} attempts", self.attempt),
            format!("  Last error: {}", self.error_message),
            format!("  Dataset: {dataset}"),
            format!("  Endpoint: {}", self.endpoint),
            "  Suggestions:".to_string(),
        ];
        for suggestion in self.format_suggestions() {
            lines.push(format!("    - {suggestion}"));
        }
        lines.join("\n")
    }

    /// Derive suggestions tailored to the current retry context.
    pub fn format_suggestions(&self) -> Vec<String> {
        vec![
            self.error_type.suggestion().to_string(),
            format!(
                "Try increasing --max-retries (current: {})",
                self.max_attempts
            ),
        ]
    }
}

/// Classify a failed attempt from an HTTP status or a reqwest error.
pub fn extract_error_type(status: Option<u16>, err: Option<&ReqwestError>) -> RetryErrorType {
    if let Some(status) = status {
        match status {
            401 | 403 => return RetryErrorType::AuthFailed(status),
            429 => return RetryErrorType::RateLimit,
            500..=599 => return RetryErrorType::ServerError(status),
            _ => return RetryErrorType::ClientError(status),
        }
    }

    if let Some(err) = err {
        if err.is_timeout() {
            return RetryErrorType::NetworkTimeout;
        }

        if err.is_connect() {
            return RetryErrorType::NetworkOffline;
        }
    }

    RetryErrorType::NetworkGeneric
}

fn append_dataset(buffer: &mut String, dataset: &str) {
    if !dataset.is_empty() {
        buffer.push_str(" (");
        buffer.push_str(dataset);
        buffer.push(')');
    }
}
