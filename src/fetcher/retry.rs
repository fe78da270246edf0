//! Retrying transport
//!
//! Wraps a [`Transport`] with credential injection and a bounded, fixed-delay
//! retry loop. The loop is an explicit state machine:
//!
//! ```text
//! Pending -> (attempt) -> Succeeded
//!                      -> Retrying -> (wait, attempt) -> ...
//!                      -> Failed            (attempts exhausted)
//! ```
//!
//! Non-2xx statuses and transport failures are both failed attempts. A missing
//! credential fails before the first attempt and is never retried.

use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::retry_formatter::{extract_error_type, RetryContext, RetryErrorType};
use super::{AttemptFailure, FetchError, FetchResult, OutboundRequest, RawResponse, Transport};
use crate::collector::config::{retry_delay, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY_MS};
use crate::config::ProviderEndpoint;
use crate::credentials::{self, CredentialSource, EnvCredentials};
use crate::RequestMethod;

const LOGGED_BODY_CHARS: usize = 200;

/// Typed result of a single attempt
#[derive(Debug)]
enum AttemptOutcome {
    Success(RawResponse),
    Failure {
        failure: AttemptFailure,
        error_type: RetryErrorType,
        message: String,
    },
}

#[derive(Debug)]
enum RetryState {
    Pending,
    Retrying {
        attempt: u32,
        error_type: RetryErrorType,
        message: String,
    },
    Succeeded {
        attempt: u32,
        response: RawResponse,
    },
    Failed {
        attempts: u32,
        last: AttemptFailure,
        error_type: RetryErrorType,
        message: String,
    },
}

/// HTTP transport with credential injection and bounded retries
#[derive(Clone)]
pub struct RetryingTransport {
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialSource>,
    max_retries: u32,
    base_delay: Duration,
}

impl RetryingTransport {
    /// Create a retrying transport reading credentials from the environment
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            credentials: Arc::new(EnvCredentials),
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: retry_delay(DEFAULT_RETRY_DELAY_MS),
        }
    }

    /// Set the total number of attempts (at least one)
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Set the fixed delay between attempts
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Replace the credential source
    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialSource>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Configured attempt bound
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Configured delay between attempts
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Build the outbound request: a copy of the template with the credential inserted.
    pub fn prepare(
        &self,
        endpoint: &ProviderEndpoint,
        payload_template: &Map<String, Value>,
        method: RequestMethod,
    ) -> FetchResult<OutboundRequest> {
        let api_key = credentials::resolve(self.credentials.as_ref(), &endpoint.credential_env_var)?;

        let mut payload = payload_template.clone();
        payload.insert(
            endpoint.credential_field_name.clone(),
            Value::String(api_key),
        );

        Ok(OutboundRequest {
            method,
            url: endpoint.base_url.clone(),
            payload,
        })
    }

    /// Execute one logical request against `endpoint`.
    ///
    /// `dataset` only labels log lines.
    ///
    /// # Errors
    /// - [`FetchError::Credential`] if the endpoint's secret is unset (no attempt is made)
    /// - [`FetchError::RequestFailed`] once `max_retries` attempts have failed
    pub async fn execute(
        &self,
        endpoint: &ProviderEndpoint,
        payload_template: &Map<String, Value>,
        method: RequestMethod,
        dataset: &str,
    ) -> FetchResult<RawResponse> {
        let request = self.prepare(endpoint, payload_template, method)?;
        let mut state = RetryState::Pending;

        loop {
            state = match state {
                RetryState::Pending => self.attempt(&request, 1, dataset).await,
                RetryState::Retrying {
                    attempt,
                    error_type,
                    message,
                } => {
                    let ctx = RetryContext::new(
                        attempt,
                        self.max_retries,
                        error_type,
                        self.base_delay,
                        dataset,
                        message,
                        &request.url,
                    );
                    info!("{}", ctx.format_retry());
                    tokio::time::sleep(self.base_delay).await;
                    self.attempt(&request, attempt + 1, dataset).await
                }
                RetryState::Succeeded { attempt, response } => {
                    if attempt > 1 {
                        let ctx = RetryContext::new(
                            attempt,
                            self.max_retries,
                            RetryErrorType::NetworkGeneric,
                            Duration::ZERO,
                            dataset,
                            "",
                            &request.url,
                        );
                        info!("{}", ctx.format_success());
                    }
                    return Ok(response);
                }
                RetryState::Failed {
                    attempts,
                    last,
                    error_type,
                    message,
                } => {
                    let ctx = RetryContext::new(
                        attempts,
                        self.max_retries,
                        error_type,
                        Duration::ZERO,
                        dataset,
                        message,
                        &request.url,
                    );
                    error!("{}", ctx.format_failure());
                    return Err(FetchError::RequestFailed { attempts, last });
                }
            };
        }
    }

    async fn attempt(&self, request: &OutboundRequest, attempt: u32, dataset: &str) -> RetryState {
        info!(
            dataset,
            url = %request.url,
            params = ?request.parameter_names(),
            "Sending API request (attempt {}/{})",
            attempt,
            self.max_retries
        );

        match self.send_once(request).await {
            AttemptOutcome::Success(response) => {
                debug!(dataset, status = response.status, "Request succeeded");
                RetryState::Succeeded { attempt, response }
            }
            AttemptOutcome::Failure {
                failure,
                error_type,
                message,
            } => {
                warn!(
                    dataset,
                    "Attempt {}/{} failed: {} ({})",
                    attempt,
                    self.max_retries,
                    error_type.description(),
                    message
                );
                if attempt >= self.max_retries {
                    RetryState::Failed {
                        attempts: attempt,
                        last: failure,
                        error_type,
                        message,
                    }
                } else {
                    RetryState::Retrying {
                        attempt,
                        error_type,
                        message,
                    }
                }
            }
        }
    }

    async fn send_once(&self, request: &OutboundRequest) -> AttemptOutcome {
        match self.transport.send(request).await {
            Ok(response) if response.is_success() => AttemptOutcome::Success(response),
            Ok(response) => {
                let snippet: String = response.body.chars().take(LOGGED_BODY_CHARS).collect();
                error!("API request failed: {} - {}", response.status, snippet);
                AttemptOutcome::Failure {
                    failure: AttemptFailure::Status(response.status),
                    error_type: extract_error_type(Some(response.status), None),
                    message: format!("HTTP status {}", response.status),
                }
            }
            Err(e) => AttemptOutcome::Failure {
                failure: AttemptFailure::Network(e.message.clone()),
                error_type: e.error_type,
                message: e.message,
            },
        }
    }
}
