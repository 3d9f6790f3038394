//! # kc-http
//!
//! HTTP request execution core for Kontent.ai SDKs.
//!
//! This crate provides the single request path the SDKs share:
//! - Header merging, SDK identification and continuation tokens
//! - Pluggable transport adapters (reqwest by default)
//! - Classification of failed exchanges into typed errors
//! - Configurable retry with `Retry-After` support
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Application Layer                        │
//! │  (delivery, management and sync SDK clients)                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      HttpService                            │
//! │  - URL and body validation                                  │
//! │  - Header merging (service, request, SDK id)                │
//! │  - Retry loop and error classification                      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  HttpAdapter (trait)                        │
//! │  - One raw exchange per call                                │
//! │  - ReqwestAdapter, or any injected implementation           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use kontent_kc_http::{HttpService, HttpServiceConfig, RequestOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), kontent_kc_http::Error> {
//!     let service = HttpService::new(
//!         HttpServiceConfig::builder()
//!             .with_api_key("secure-api-key")
//!             .build(),
//!     )?;
//!
//!     let items = service
//!         .request::<serde_json::Value, _>(RequestOptions::get(
//!             "https://deliver.kontent.ai/<environment-id>/items",
//!         ))
//!         .await?;
//!
//!     if let Some(token) = items.continuation_token() {
//!         println!("next page: {token}");
//!     }
//!     Ok(())
//! }
//! ```

mod adapter;
#[cfg(feature = "native")]
mod client;
mod config;
mod error;
/// Header helpers shared with the SDK clients built on this crate
/// (continuation paging, SDK identification, `Retry-After`).
pub mod headers;
mod request;
mod response;
mod retry;
mod service;

pub use adapter::{
    AdapterBody, AdapterRequest, AdapterResponse, BodyReader, BufferedBody, HttpAdapter,
    ResponseInfo,
};
#[cfg(feature = "native")]
pub use client::ReqwestAdapter;
pub use config::{AdapterConfig, HttpServiceConfig, HttpServiceConfigBuilder, SdkInfo};
pub use error::{
    BoxError, Error, ErrorKind, ErrorReason, PanicError, ResponseErrorDetails, Result,
    ValidationError,
};
pub use headers::Header;
pub use request::{
    Blob, DownloadFileOptions, RequestBody, RequestMethod, RequestOptions, UploadFileOptions,
};
pub use response::{HttpResponse, KontentErrorResponse, KontentValidationError, ResponseValidator};
pub use retry::{
    default_can_retry_error, default_delay_between_retries, execute_with_retry, BackoffStrategy,
    CanRetryFn, DelayFn, RetryDecision, RetryLogFn, RetryLogger, RetryStrategy,
    RetryStrategyOptions, DEFAULT_MAX_RETRIES,
};
pub use service::HttpService;

/// Package registry host reported in the SDK id header.
pub const SDK_HOST: &str = "crates.io";

/// User-Agent string for the default adapter
pub const USER_AGENT: &str = concat!("kontent-kc-http/", env!("CARGO_PKG_VERSION"));
