use std::time::Duration;

use econ_data_collector::fetcher::retry_formatter::{
    extract_error_type, RetryContext, RetryErrorType,
};

fn sample_context(error_type: RetryErrorType) -> RetryContext {
    RetryContext::new(
        2,
        5,
        error_type,
        Duration::from_secs(1),
        "CPI",
        "HTTP status 503",
        "https://api.bls.gov/publicAPI/v2/timeseries/data/",
    )
}

#[test]
fn format_retry_captures_attempt_and_wait() {
    let ctx = sample_context(RetryErrorType::RateLimit);
    let message = ctx.format_retry();
    assert!(message.contains("attempt 3/5"));
    assert!(message.contains("rate limit exceeded"));
    assert!(message.contains("1.0 seconds"));
    assert!(message.contains("(CPI)"));
}

#[test]
fn format_success_includes_dataset() {
    let ctx = sample_context(RetryErrorType::NetworkTimeout);
    let message = ctx.format_success();
    assert!(message.contains("Retry attempt 2/5 succeeded"));
    assert!(message.contains("CPI"));
}

#[test]
fn format_failure_lists_suggestions() {
    let ctx = sample_context(RetryErrorType::ServerError(502));
    let output = ctx.format_failure();
    assert!(output.contains("Request failed after 2 attempts"));
    assert!(output.contains("Last error: HTTP status 503"));
    assert!(output.contains("Dataset: CPI"));
    assert!(output.contains("api.bls.gov"));
    assert!(output.contains("statistics service"));
    assert!(output.contains("--max-retries"));
}

#[test]
fn auth_failure_points_at_api_key() {
    let ctx = sample_context(RetryErrorType::AuthFailed(401));
    assert!(ctx
        .format_suggestions()
        .iter()
        .any(|s| s.contains(".env")));
}

#[test]
fn extract_error_type_classifies_status_codes() {
    assert_eq!(
        extract_error_type(Some(400), None),
        RetryErrorType::ClientError(400)
    );
    assert_eq!(
        extract_error_type(Some(401), None),
        RetryErrorType::AuthFailed(401)
    );
    assert_eq!(extract_error_type(Some(429), None), RetryErrorType::RateLimit);
    assert_eq!(
        extract_error_type(Some(504), None),
        RetryErrorType::ServerError(504)
    );
    assert_eq!(extract_error_type(None, None), RetryErrorType::NetworkGeneric);
}

#[test]
fn descriptions_are_specific() {
    assert_eq!(RetryErrorType::ServerError(500).description(), "internal server error");
    assert_eq!(RetryErrorType::ServerError(503).description(), "service unavailable");
    assert_eq!(RetryErrorType::ClientError(404).description(), "resource not found");
    assert_eq!(RetryErrorType::NetworkOffline.description(), "connection failed");
}
