//! reqwest-backed transport

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::sync::Arc;
use tracing::debug;

use super::retry_formatter::extract_error_type;
use super::shared_resources::global_http_client;
use super::{OutboundRequest, RawResponse, SendError, Transport};
use crate::RequestMethod;

/// Sends requests with a shared `reqwest::Client`
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Arc<Client>,
}

impl ReqwestTransport {
    /// Create a transport over the given client
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(global_http_client())
    }
}

fn send_error(e: reqwest::Error) -> SendError {
    SendError::new(extract_error_type(None, Some(&e)), e.to_string())
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &OutboundRequest) -> Result<RawResponse, SendError> {
        debug!(
            method = %request.method,
            url = %request.url,
            params = ?request.parameter_names(),
            "Sending request"
        );

        let builder = match request.method {
            RequestMethod::Get => self.client.get(&request.url).query(&request.query_pairs()),
            RequestMethod::Post => self.client.post(&request.url).json(&request.payload),
        };

        let response = builder.send().await.map_err(send_error)?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.map_err(send_error)?;

        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }
}
