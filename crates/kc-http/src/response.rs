//! Response envelopes and server error payloads.

use std::sync::OnceLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::adapter::{AdapterBody, ResponseInfo};
use crate::error::ValidationError;
use crate::headers::{self, Header};
use crate::request::RequestMethod;

/// Successful response envelope.
#[derive(Debug, Clone)]
pub struct HttpResponse<T> {
    /// Decoded response data.
    pub data: T,
    /// Body that was sent with the request.
    pub body: AdapterBody,
    /// Request method.
    pub method: RequestMethod,
    /// Status line and headers of the final exchange.
    pub adapter_response: ResponseInfo,
    /// Headers that were sent.
    pub request_headers: Vec<Header>,
}

impl<T> HttpResponse<T> {
    /// HTTP status code.
    pub fn status(&self) -> u16 {
        self.adapter_response.status
    }

    /// Response headers.
    pub fn response_headers(&self) -> &[Header] {
        &self.adapter_response.response_headers
    }

    /// Continuation token for the next page, if the server sent one.
    pub fn continuation_token(&self) -> Option<&str> {
        headers::continuation_token(&self.adapter_response.response_headers)
    }

    /// Transform the data, keeping the rest of the envelope.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> HttpResponse<U> {
        HttpResponse {
            data: f(self.data),
            body: self.body,
            method: self.method,
            adapter_response: self.adapter_response,
            request_headers: self.request_headers,
        }
    }
}

/// Checks a decoded JSON body before it is handed to the caller.
pub trait ResponseValidator: Send + Sync {
    /// Return `Err` if `data` does not have the expected shape.
    fn validate(&self, data: &serde_json::Value) -> Result<(), ValidationError>;
}

impl<F> ResponseValidator for F
where
    F: Fn(&serde_json::Value) -> Result<(), ValidationError> + Send + Sync,
{
    fn validate(&self, data: &serde_json::Value) -> Result<(), ValidationError> {
        self(data)
    }
}

/// Structured error payload returned by the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KontentErrorResponse {
    /// Human-readable message.
    pub message: String,
    /// Server-side request id.
    #[serde(default)]
    pub request_id: Option<String>,
    /// Numeric error code.
    #[serde(default)]
    pub error_code: Option<i64>,
    /// More specific error code.
    #[serde(default)]
    pub specific_code: Option<i64>,
    /// Per-field validation problems.
    #[serde(default)]
    pub validation_errors: Vec<KontentValidationError>,
}

/// One validation problem in a [`KontentErrorResponse`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KontentValidationError {
    /// What is wrong.
    pub message: String,
    /// Path to the offending element.
    #[serde(default)]
    pub path: Option<String>,
    /// Line in the submitted document.
    #[serde(default)]
    pub line: Option<u32>,
    /// Position within the line.
    #[serde(default)]
    pub position: Option<u32>,
}

/// Parse a structured error payload, if the body has the known shape.
pub(crate) fn parse_error_payload(body: &serde_json::Value) -> Option<KontentErrorResponse> {
    serde_json::from_value(body.clone()).ok()
}

/// Sanitize an error message before it ends up in logs or errors.
///
/// This function:
/// - Redacts bearer tokens
/// - Truncates messages longer than 500 characters
pub(crate) fn sanitize_error_message(message: &str) -> String {
    const MAX_LENGTH: usize = 500;
    static BEARER: OnceLock<Option<Regex>> = OnceLock::new();

    let mut sanitized = message.to_string();

    let bearer = BEARER.get_or_init(|| Regex::new(r"(?i)bearer\s+[A-Za-z0-9\-_.=+/]+").ok());
    if let Some(pattern) = bearer {
        sanitized = pattern
            .replace_all(&sanitized, "Bearer [REDACTED]")
            .to_string();
    }

    if sanitized.chars().count() > MAX_LENGTH {
        sanitized = sanitized.chars().take(MAX_LENGTH).collect();
        sanitized.push_str("...[truncated]");
    }

    sanitized
}
