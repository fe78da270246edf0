//! Integration tests for the retrying transport
//!
//! Every test drives `RetryingTransport` against a scripted transport, so the
//! number of sends and the virtual time spent waiting are exact.

use crate::support::{
    bls_response, connection_refused, json_ok, secrets, status, text_ok, ScriptedTransport,
};
use econ_data_collector::collector::{CollectError, DatasetExecutor, DatasetJob};
use econ_data_collector::config::{DatasetDescriptor, ProviderEndpoint};
use econ_data_collector::credentials::CredentialError;
use econ_data_collector::fetcher::{AttemptFailure, FetchError, RetryingTransport};
use econ_data_collector::{ProviderKind, RequestMethod};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn bls_endpoint() -> ProviderEndpoint {
    ProviderEndpoint {
        api_name: "BLS".to_string(),
        base_url: "https://api.bls.gov/publicAPI/v2/timeseries/data/".to_string(),
        credential_env_var: "BLS_API_KEY".to_string(),
        credential_field_name: "registrationkey".to_string(),
    }
}

fn cpi_payload() -> Map<String, Value> {
    json!({"seriesid": ["CUUR0000SA0"], "startyear": "2020", "endyear": "2024"})
        .as_object()
        .unwrap()
        .clone()
}

fn retrying(transport: Arc<ScriptedTransport>, max_retries: u32) -> RetryingTransport {
    RetryingTransport::new(transport)
        .with_max_retries(max_retries)
        .with_base_delay(Duration::from_secs(1))
        .with_credentials(secrets(&[("BLS_API_KEY", "bls-secret")]))
}

/// Scenario D: unset credential fails before any network attempt
#[tokio::test]
async fn test_missing_credential_makes_no_attempt() {
    let transport = Arc::new(ScriptedTransport::new(vec![json_ok(json!({}))]));
    let retrying = RetryingTransport::new(transport.clone())
        .with_credentials(Arc::new(HashMap::<String, String>::new()));

    let err = retrying
        .execute(&bls_endpoint(), &cpi_payload(), RequestMethod::Post, "CPI")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        FetchError::Credential(CredentialError::Missing(ref var)) if var == "BLS_API_KEY"
    ));
    assert_eq!(
        err.to_string(),
        "configuration error: BLS_API_KEY is not set! Check your .env file."
    );
    assert_eq!(transport.sends(), 0);
}

#[tokio::test]
async fn test_blank_credential_is_missing() {
    let transport = Arc::new(ScriptedTransport::new(vec![json_ok(json!({}))]));
    let retrying = RetryingTransport::new(transport.clone())
        .with_credentials(secrets(&[("BLS_API_KEY", "   ")]));

    let err = retrying
        .execute(&bls_endpoint(), &cpi_payload(), RequestMethod::Post, "CPI")
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Credential(_)));
    assert_eq!(transport.sends(), 0);
}

/// Scenario E: three 500s with max_retries=3 fail after exactly three sends
#[tokio::test(start_paused = true)]
async fn test_server_errors_exhaust_attempts() {
    let transport = Arc::new(ScriptedTransport::new(vec![status(500)]));

    let err = retrying(transport.clone(), 3)
        .execute(&bls_endpoint(), &cpi_payload(), RequestMethod::Post, "CPI")
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("3 attempts"), "{message}");
    assert!(message.contains("500"), "{message}");
    assert!(matches!(
        err,
        FetchError::RequestFailed {
            attempts: 3,
            last: AttemptFailure::Status(500)
        }
    ));
    assert_eq!(transport.sends(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_recovers_after_transient_failures() {
    let body = bls_response("CUUR0000SA0", &[("2024", "January", "308.417")]);
    let transport = Arc::new(ScriptedTransport::new(vec![
        status(503),
        status(502),
        json_ok(body.clone()),
    ]));

    let started = tokio::time::Instant::now();
    let response = retrying(transport.clone(), 5)
        .execute(&bls_endpoint(), &cpi_payload(), RequestMethod::Post, "CPI")
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(transport.sends(), 3);
    assert_eq!(response.status, 200);
    assert_eq!(serde_json::from_str::<Value>(&response.body).unwrap(), body);

    // two failures, two fixed one-second waits
    assert!(elapsed >= Duration::from_secs(2), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(2100), "{elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn test_delay_is_fixed_between_attempts() {
    let transport = Arc::new(ScriptedTransport::new(vec![status(500)]));

    let started = tokio::time::Instant::now();
    let _ = retrying(transport.clone(), 4)
        .execute(&bls_endpoint(), &cpi_payload(), RequestMethod::Post, "CPI")
        .await;
    let elapsed = started.elapsed();

    // four attempts, three waits of one second each; no exponential growth
    assert_eq!(transport.sends(), 4);
    assert!(elapsed >= Duration::from_secs(3), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(3100), "{elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn test_network_failures_are_retried() {
    let transport = Arc::new(ScriptedTransport::new(vec![
        connection_refused(),
        json_ok(json!({"Results": {"series": []}})),
    ]));

    retrying(transport.clone(), 3)
        .execute(&bls_endpoint(), &cpi_payload(), RequestMethod::Post, "CPI")
        .await
        .unwrap();

    assert_eq!(transport.sends(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_network_failure_reported_when_last() {
    let transport = Arc::new(ScriptedTransport::new(vec![connection_refused()]));

    let err = retrying(transport.clone(), 2)
        .execute(&bls_endpoint(), &cpi_payload(), RequestMethod::Post, "CPI")
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "API request failed after 2 attempts (last status: network error)"
    );
    assert_eq!(transport.sends(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_client_errors_are_retried_too() {
    let transport = Arc::new(ScriptedTransport::new(vec![status(404), status(404), status(200)]));

    let err = retrying(transport.clone(), 2)
        .execute(&bls_endpoint(), &cpi_payload(), RequestMethod::Post, "CPI")
        .await
        .unwrap_err();

    assert!(err.to_string().contains("last status: 404"));
    assert_eq!(transport.sends(), 2);
}

#[tokio::test]
async fn test_credential_sent_under_provider_field() {
    let transport = Arc::new(ScriptedTransport::new(vec![json_ok(json!({}))]));

    retrying(transport.clone(), 1)
        .execute(&bls_endpoint(), &cpi_payload(), RequestMethod::Post, "CPI")
        .await
        .unwrap();

    let sent = transport.requests();
    assert_eq!(sent[0].payload["registrationkey"], json!("bls-secret"));
    assert_eq!(sent[0].payload["seriesid"], json!(["CUUR0000SA0"]));
    assert_eq!(sent[0].method, RequestMethod::Post);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_success_body_is_not_retried() {
    let transport = Arc::new(ScriptedTransport::new(vec![text_ok("<html><body>Service Notice")]));
    let dir = TempDir::new().unwrap();

    let descriptor = Arc::new(DatasetDescriptor {
        dataset_name: "CPI".to_string(),
        provider_kind: ProviderKind::Bls,
        request_method: RequestMethod::Post,
        payload_template: cpi_payload(),
        required_fields: vec!["year".to_string(), "value".to_string()],
        stamp_series_id: false,
    });
    let mut job = DatasetJob::new(Arc::new(bls_endpoint()), descriptor, dir.path());

    let err = DatasetExecutor::new(retrying(transport.clone(), 3))
        .execute(&mut job)
        .await
        .unwrap_err();

    assert!(matches!(err, CollectError::Decode(_)));
    assert_eq!(transport.sends(), 1);
    assert!(!job.output_path.exists());
}
