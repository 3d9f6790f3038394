//! Request lifecycle scenarios over a scripted transport.

use kontent_core_sdk::{ErrorReason, HttpResponse, RequestOptions, RetryStrategy};
use serde::Deserialize;

use crate::common::{init_tracing, MockAdapter, MockReply, ITEMS_URL};

#[derive(Debug, Deserialize)]
struct Item {
    codename: String,
}

// ============================================================================
// Success
// ============================================================================

#[tokio::test]
async fn test_first_attempt_success() {
    init_tracing();
    let adapter = MockAdapter::always(MockReply::json(200, serde_json::json!({"codename": "x"})));

    let response: HttpResponse<Item> = adapter
        .service()
        .request(RequestOptions::get(ITEMS_URL))
        .await
        .expect("request should succeed");

    assert_eq!(response.data.codename, "x");
    assert_eq!(response.status(), 200);
    assert_eq!(adapter.calls(), 1);
}

#[tokio::test]
async fn test_success_after_transient_failures() {
    init_tracing();
    let adapter = MockAdapter::new(vec![
        MockReply::status(500),
        MockReply::status(500),
        MockReply::json(200, serde_json::json!({})),
    ]);
    let strategy = RetryStrategy::default()
        .with_max_retries(3)
        .with_can_retry_error(|_| true);

    let response = adapter
        .service()
        .request::<serde_json::Value, _>(RequestOptions::get(ITEMS_URL).retry_strategy(strategy))
        .await;

    assert!(response.is_ok(), "{:?}", response.err());
    assert_eq!(adapter.calls(), 3);
}

// ============================================================================
// Failure
// ============================================================================

#[tokio::test]
async fn test_unauthorized_is_final() {
    init_tracing();
    let adapter = MockAdapter::always(MockReply::status(401));

    let err = adapter
        .service()
        .request::<serde_json::Value, _>(RequestOptions::get(ITEMS_URL))
        .await
        .unwrap_err();

    assert_eq!(err.reason(), ErrorReason::Unauthorized);
    assert_eq!(err.retry_attempt, 0);
    assert_eq!(err.status(), Some(401));
    assert_eq!(adapter.calls(), 1);
}

#[tokio::test]
async fn test_malformed_url() {
    init_tracing();
    let adapter = MockAdapter::always(MockReply::status(200));

    let err = adapter
        .service()
        .request::<serde_json::Value, _>(RequestOptions::get("not a url"))
        .await
        .unwrap_err();

    assert_eq!(err.reason(), ErrorReason::InvalidUrl);
    assert_eq!(err.reason().as_str(), "invalidUrl");
    assert_eq!(adapter.calls(), 0);
}

#[tokio::test]
async fn test_server_error_payload_reaches_caller() {
    init_tracing();
    let adapter = MockAdapter::always(MockReply::json(
        400,
        serde_json::json!({
            "message": "The provided request body is invalid.",
            "request_id": "80000004-0002-fd00-b63f-84710c7967bb",
            "error_code": 5,
            "validation_errors": [
                {"message": "Unexpected character", "path": "elements", "line": 3, "position": 14}
            ]
        }),
    ));

    let err = adapter
        .service()
        .request::<serde_json::Value, _>(
            RequestOptions::post(ITEMS_URL).json(serde_json::json!({"elements": "oops"})),
        )
        .await
        .unwrap_err();

    assert_eq!(err.reason(), ErrorReason::InvalidResponse);
    assert_eq!(adapter.calls(), 1);

    let message = err.to_string();
    assert!(message.contains("Failed to execute 'POST' request"), "{message}");
    assert!(message.contains("The provided request body is invalid."), "{message}");
    assert!(message.contains("at path 'elements' line 3 position 14"), "{message}");
}

#[tokio::test]
async fn test_error_message_counts_retries() {
    init_tracing();
    let adapter = MockAdapter::always(MockReply::status(502));

    let err = adapter
        .service()
        .request::<serde_json::Value, _>(
            RequestOptions::get(ITEMS_URL).retry_strategy(
                RetryStrategy::default()
                    .with_max_retries(2)
                    .without_retry_logging(),
            ),
        )
        .await
        .unwrap_err();

    assert!(err.to_string().contains("after 2 retry attempt(s)"), "{err}");
}

// ============================================================================
// Pagination support
// ============================================================================

#[tokio::test]
async fn test_continuation_token_is_exposed() {
    init_tracing();
    let adapter = MockAdapter::always(
        MockReply::json(200, serde_json::json!({"items": []}))
            .with_header("X-Continuation", "+RID:~abc"),
    );

    let response = adapter
        .service()
        .request::<serde_json::Value, _>(
            RequestOptions::get(format!("{ITEMS_URL}-feed"))
                .headers([kontent_core_sdk::http::headers::continuation_header("+RID:~prev")]),
        )
        .await
        .unwrap();

    assert_eq!(response.continuation_token(), Some("+RID:~abc"));
    let sent = &adapter.requests()[0];
    assert_eq!(
        kontent_core_sdk::http::headers::continuation_token(&sent.request_headers),
        Some("+RID:~prev")
    );
}
