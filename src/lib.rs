//! # kontent-core-sdk
//!
//! Request execution core shared by the Kontent.ai client SDKs for Rust.
//!
//! Every request the SDKs send goes through one [`HttpService`]: headers are
//! merged, the body is encoded, the transport adapter is called, and failed
//! exchanges are classified and retried according to a [`RetryStrategy`].
//! Operations never panic; failures come back as a typed [`Error`] whose
//! [`ErrorReason`] supports exhaustive handling.
//!
//! ## Crates
//!
//! - **kontent-kc-http** - HTTP service, retry engine, error model, reqwest adapter
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use kontent_core_sdk::{HttpService, HttpServiceConfig, RequestOptions, RetryStrategy};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = HttpService::new(
//!         HttpServiceConfig::builder()
//!             .with_api_key("management-api-key")
//!             .with_retry(RetryStrategy::default().with_max_retries(5))
//!             .build(),
//!     )?;
//!
//!     let response = service
//!         .request::<serde_json::Value, _>(
//!             RequestOptions::post("https://manage.kontent.ai/v2/projects/<id>/items")
//!                 .json(serde_json::json!({"name": "Home", "type": {"codename": "page"}})),
//!         )
//!         .await;
//!
//!     match response {
//!         Ok(created) => println!("created {}", created.data["id"]),
//!         Err(err) => eprintln!("{} ({})", err, err.reason()),
//!     }
//!
//!     Ok(())
//! }
//! ```

// Re-export the core crate for convenient access
pub use kontent_kc_http as http;

// Re-export commonly used types at the top level
pub use kontent_kc_http::{
    Blob, DownloadFileOptions, Error, ErrorKind, ErrorReason, Header, HttpAdapter, HttpResponse,
    HttpService, HttpServiceConfig, RequestMethod, RequestOptions, Result, RetryStrategy,
    UploadFileOptions,
};

#[cfg(feature = "native")]
pub use kontent_kc_http::ReqwestAdapter;
