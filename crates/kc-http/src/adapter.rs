//! Transport adapter contract.
//!
//! An adapter performs exactly one raw HTTP exchange. It reports every
//! completed exchange as an [`AdapterResponse`], including non-2xx ones;
//! `Err` is reserved for exchanges that never produced a response.

use std::fmt;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::BoxError;
use crate::headers::Header;
use crate::request::{Blob, RequestMethod};

/// Body handed to the adapter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AdapterBody {
    /// No body.
    #[default]
    Empty,
    /// Serialized JSON text.
    Json(String),
    /// Binary payload, sent untouched.
    Binary(Blob),
}

/// One raw HTTP exchange to perform.
#[derive(Debug, Clone)]
pub struct AdapterRequest {
    /// Absolute URL.
    pub url: String,
    /// HTTP method.
    pub method: RequestMethod,
    /// Final header set.
    pub request_headers: Vec<Header>,
    /// Request body.
    pub body: AdapterBody,
}

/// Status line and headers of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseInfo {
    /// Transport-level success (2xx), independent of body shape.
    pub is_valid_response: bool,
    /// HTTP status code.
    pub status: u16,
    /// HTTP status text.
    pub status_text: String,
    /// Response headers.
    pub response_headers: Vec<Header>,
    /// Final URL of the exchange.
    pub url: String,
}

/// Lazy reader for a response body.
///
/// Both methods consume the reader, so a body is read at most once.
pub trait BodyReader: Send {
    /// Read and parse the body as JSON.
    fn to_json(self: Box<Self>) -> BoxFuture<'static, Result<serde_json::Value, BoxError>>;

    /// Read the body as raw bytes.
    fn to_blob(self: Box<Self>) -> BoxFuture<'static, Result<Blob, BoxError>>;
}

/// Normalized response envelope produced by an adapter.
pub struct AdapterResponse {
    /// Status line and headers.
    pub info: ResponseInfo,
    /// Deferred body access.
    pub reader: Box<dyn BodyReader>,
}

impl AdapterResponse {
    /// Create a response envelope.
    pub fn new(info: ResponseInfo, reader: Box<dyn BodyReader>) -> Self {
        Self { info, reader }
    }

    /// Transport-level success flag.
    pub fn is_valid_response(&self) -> bool {
        self.info.is_valid_response
    }

    /// HTTP status code.
    pub fn status(&self) -> u16 {
        self.info.status
    }

    /// Split into status/headers and the body reader.
    pub fn into_parts(self) -> (ResponseInfo, Box<dyn BodyReader>) {
        (self.info, self.reader)
    }
}

impl fmt::Debug for AdapterResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterResponse")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

/// Pluggable transport capability.
pub trait HttpAdapter: Send + Sync {
    /// Perform one HTTP exchange.
    fn call(&self, request: AdapterRequest) -> BoxFuture<'_, Result<AdapterResponse, BoxError>>;
}

/// Body reader over bytes already held in memory.
///
/// Useful for adapters that buffer whole responses, and for test doubles.
#[derive(Debug, Clone, Default)]
pub struct BufferedBody {
    bytes: bytes::Bytes,
    content_type: Option<String>,
}

impl BufferedBody {
    /// Wrap buffered bytes.
    pub fn new(bytes: impl Into<bytes::Bytes>, content_type: Option<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type,
        }
    }

    /// Serialize a JSON value into a buffered body.
    pub fn json(value: &serde_json::Value) -> Self {
        Self::new(
            value.to_string().into_bytes(),
            Some(crate::headers::JSON_CONTENT_TYPE.to_string()),
        )
    }
}

impl BodyReader for BufferedBody {
    fn to_json(self: Box<Self>) -> BoxFuture<'static, Result<serde_json::Value, BoxError>> {
        Box::pin(async move {
            if self.bytes.is_empty() {
                return Ok(serde_json::Value::Null);
            }
            serde_json::from_slice::<serde_json::Value>(&self.bytes).map_err(BoxError::from)
        })
    }

    fn to_blob(self: Box<Self>) -> BoxFuture<'static, Result<Blob, BoxError>> {
        Box::pin(async move {
            Ok::<_, BoxError>(Blob {
                data: self.bytes,
                content_type: self.content_type,
            })
        })
    }
}
