//! Invariants of the retry engine, error classifier and header merge.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use kontent_core_sdk::http::headers::combined_request_headers;
use kontent_core_sdk::http::{
    default_delay_between_retries, AdapterBody, AdapterRequest, AdapterResponse, BackoffStrategy,
    BoxError, HttpAdapter, PanicError, SdkInfo,
};
use kontent_core_sdk::{
    Blob, ErrorReason, Header, HttpService, HttpServiceConfig, RequestOptions, RetryStrategy,
};

use crate::common::{init_tracing, MockAdapter, MockReply, ITEMS_URL};

#[derive(Debug, PartialEq)]
struct ReaderFault(&'static str);

impl fmt::Display for ReaderFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "reader fault: {}", self.0)
    }
}

impl std::error::Error for ReaderFault {}

struct PanickingAdapter;

impl HttpAdapter for PanickingAdapter {
    fn call(&self, _request: AdapterRequest) -> BoxFuture<'_, Result<AdapterResponse, BoxError>> {
        std::panic::panic_any(42_i32)
    }
}

fn quiet(strategy: RetryStrategy) -> RetryStrategy {
    strategy.without_retry_logging()
}

#[tokio::test]
async fn test_outcome_follows_status_class() {
    init_tracing();
    for status in [200u16, 201, 204, 301, 400, 403, 409, 500] {
        let adapter = MockAdapter::always(MockReply::status(status));
        let result = adapter
            .service()
            .request::<serde_json::Value, _>(
                RequestOptions::get(ITEMS_URL).retry_strategy(RetryStrategy::no_retry()),
            )
            .await;

        match result {
            Ok(response) => assert!((200..300).contains(&response.status())),
            Err(err) => {
                assert!(!(200..300).contains(&status));
                assert_eq!(err.status(), Some(status));
            }
        }
    }
}

#[tokio::test]
async fn test_retry_bound_is_exact() {
    init_tracing();
    for max_retries in 0..=4u32 {
        let adapter = MockAdapter::always(MockReply::Fail(Arc::new(|| {
            BoxError::from("connection refused")
        })));
        let strategy = quiet(
            RetryStrategy::default()
                .with_max_retries(max_retries)
                .with_can_retry_error(|_| true),
        );

        let err = adapter
            .service()
            .request::<serde_json::Value, _>(
                RequestOptions::get(ITEMS_URL).retry_strategy(strategy),
            )
            .await
            .unwrap_err();

        assert_eq!(adapter.calls(), max_retries + 1);
        assert_eq!(err.retry_attempt, max_retries);
        assert_eq!(err.reason(), ErrorReason::Unknown);
    }
}

#[tokio::test]
async fn test_not_found_never_retries() {
    init_tracing();
    let adapter = MockAdapter::always(MockReply::status(404));

    let err = adapter
        .service()
        .request::<serde_json::Value, _>(RequestOptions::get(ITEMS_URL))
        .await
        .unwrap_err();

    assert_eq!(err.reason(), ErrorReason::NotFound);
    assert_eq!(err.retry_attempt, 0);
    assert_eq!(adapter.calls(), 1);
}

#[tokio::test]
async fn test_server_errors_and_throttling_retry() {
    init_tracing();
    for status in [500u16, 503, 429] {
        let adapter = MockAdapter::always(MockReply::status(status));
        let svc = adapter.service_with(
            HttpServiceConfig::builder()
                .with_retry(quiet(RetryStrategy::default().with_max_retries(1)))
                .build(),
        );

        let err = svc
            .request::<serde_json::Value, _>(RequestOptions::get(ITEMS_URL))
            .await
            .unwrap_err();

        assert_eq!(adapter.calls(), 2, "status {status}");
        assert_eq!(err.retry_attempt, 1);
    }
}

#[test]
fn test_header_merge_is_idempotent() {
    let sdk = SdkInfo::default();
    let service_headers = vec![Header::new("Authorization", "Bearer k")];
    let request_headers = vec![Header::new("X-KC-Wait-For-Loading-New-Content", "true")];

    for body in [
        AdapterBody::Empty,
        AdapterBody::Json("{}".to_string()),
        AdapterBody::Binary(Blob::new(vec![1u8, 2, 3]).with_content_type("image/png")),
    ] {
        let once = combined_request_headers(&service_headers, &request_headers, &body, &sdk);
        let twice = combined_request_headers(&once, &request_headers, &body, &sdk);
        assert_eq!(once, twice);
    }
}

#[tokio::test]
async fn test_reader_failure_is_captured() {
    init_tracing();
    let adapter = MockAdapter::always(MockReply::BrokenJson(Arc::new(|| {
        Box::new(ReaderFault("socket closed")) as BoxError
    })));

    let err = adapter
        .service()
        .request::<serde_json::Value, _>(
            RequestOptions::get(ITEMS_URL).retry_strategy(RetryStrategy::no_retry()),
        )
        .await
        .unwrap_err();

    assert_eq!(err.reason(), ErrorReason::Unknown);
    let original = err.original_error().unwrap();
    assert_eq!(
        original.downcast_ref::<ReaderFault>(),
        Some(&ReaderFault("socket closed"))
    );
}

#[tokio::test]
async fn test_non_string_panic_is_captured() {
    init_tracing();
    let svc = HttpService::with_adapter(
        PanickingAdapter,
        HttpServiceConfig::builder().without_retry().build(),
    );

    let err = svc
        .download_file(kontent_core_sdk::DownloadFileOptions::new(ITEMS_URL))
        .await
        .unwrap_err();

    assert_eq!(err.reason(), ErrorReason::Unknown);
    let panic = err
        .original_error()
        .and_then(|e| e.downcast_ref::<PanicError>())
        .expect("panic payload should be preserved");
    assert_eq!(panic.message, "non-string panic payload");
}

#[tokio::test]
async fn test_retry_after_is_honored() {
    init_tracing();
    let adapter = MockAdapter::always(MockReply::status(503).with_header("Retry-After", "2"));

    let err = adapter
        .service()
        .request::<serde_json::Value, _>(
            RequestOptions::get(ITEMS_URL).retry_strategy(RetryStrategy::no_retry()),
        )
        .await
        .unwrap_err();

    assert_eq!(err.reason(), ErrorReason::InvalidResponse);
    assert_eq!(default_delay_between_retries(&err), Duration::from_millis(2000));
    assert_eq!(RetryStrategy::default().delay_for(&err), Duration::from_millis(2000));

    let backoff = RetryStrategy::default().with_exponential_backoff(
        BackoffStrategy::Exponential { factor: 2.0 },
        Duration::from_millis(100),
        Duration::from_secs(30),
    );
    assert_eq!(backoff.delay_for(&err), Duration::from_millis(2000));
}

#[tokio::test]
async fn test_out_of_range_retry_after_is_not_fatal() {
    init_tracing();
    let adapter = MockAdapter::always(
        MockReply::status(503).with_header("Retry-After", "18446744073709551615"),
    );

    let err = adapter
        .service()
        .request::<serde_json::Value, _>(
            RequestOptions::get(ITEMS_URL).retry_strategy(RetryStrategy::no_retry()),
        )
        .await
        .unwrap_err();

    assert_eq!(err.reason(), ErrorReason::InvalidResponse);
    let strategy = err.retry_strategy.as_ref().unwrap();
    assert_eq!(strategy.delay_for(&err), Duration::from_secs(u64::MAX));
}

#[tokio::test]
async fn test_retry_after_ignored_for_other_reasons() {
    init_tracing();
    let adapter = MockAdapter::always(MockReply::status(404).with_header("Retry-After", "2"));

    let err = adapter
        .service()
        .request::<serde_json::Value, _>(RequestOptions::get(ITEMS_URL))
        .await
        .unwrap_err();

    assert_eq!(err.reason(), ErrorReason::NotFound);
    assert_eq!(default_delay_between_retries(&err), Duration::ZERO);
}
