//! Request/response header helpers.
//!
//! Header names are compared case-insensitively everywhere in this crate.
//! Headers are kept as an ordered list rather than a map: duplicates are
//! legal on the wire and only a few computed defaults are deduplicated.

use serde::{Deserialize, Serialize};

use crate::adapter::AdapterBody;
use crate::config::SdkInfo;

/// SDK identification header.
pub const SDK_ID_HEADER: &str = "X-KC-SDKID";
/// Continuation token header used for paging.
pub const CONTINUATION_HEADER: &str = "X-Continuation";
/// Retry-After header.
pub const RETRY_AFTER_HEADER: &str = "Retry-After";
/// Authorization header.
pub const AUTHORIZATION_HEADER: &str = "Authorization";
/// Content-Type header.
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";
/// Content-Length header.
pub const CONTENT_LENGTH_HEADER: &str = "Content-Length";

/// Content type used for every non-binary body.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A single HTTP header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Header name, as sent.
    pub name: String,
    /// Header value.
    pub value: String,
}

impl Header {
    /// Create a new header.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Returns true if this header has the given name (case-insensitive).
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// Find the first header with the given name (case-insensitive).
pub fn find_header<'a>(headers: &'a [Header], name: &str) -> Option<&'a Header> {
    headers.iter().find(|h| h.is_named(name))
}

fn contains_header(headers: &[Header], name: &str) -> bool {
    find_header(headers, name).is_some()
}

/// Build the `X-KC-SDKID: host;name;version` header.
pub fn sdk_id_header(info: &SdkInfo) -> Header {
    Header::new(
        SDK_ID_HEADER,
        format!("{};{};{}", info.host, info.name, info.version),
    )
}

/// Build an `Authorization: Bearer <key>` header.
pub fn authorization_header(api_key: &str) -> Header {
    Header::new(AUTHORIZATION_HEADER, format!("Bearer {}", api_key))
}

/// Build an `X-Continuation` header carrying a paging token.
pub fn continuation_header(token: &str) -> Header {
    Header::new(CONTINUATION_HEADER, token)
}

/// Extract the continuation token from response headers.
///
/// Empty values are treated as "no token".
pub fn continuation_token(headers: &[Header]) -> Option<&str> {
    find_header(headers, CONTINUATION_HEADER)
        .map(|h| h.value.trim())
        .filter(|v| !v.is_empty())
}

/// Get the `Retry-After` header value in seconds.
///
/// Only the delta-seconds form is recognized; HTTP dates yield `None`.
pub fn retry_after_seconds(headers: &[Header]) -> Option<u64> {
    find_header(headers, RETRY_AFTER_HEADER)?
        .value
        .trim()
        .parse::<u64>()
        .ok()
}

/// Merge service-level and request-level headers and append computed defaults.
///
/// Request headers replace service headers of the same name in place; new
/// names are appended after them. Then, only if not already present:
/// - `Content-Type` (the blob's declared type, otherwise `application/json`)
/// - `Content-Length` (binary bodies only)
/// - the SDK id header
pub fn combined_request_headers(
    service_headers: &[Header],
    request_headers: &[Header],
    body: &AdapterBody,
    sdk_info: &SdkInfo,
) -> Vec<Header> {
    let mut headers: Vec<Header> = service_headers.to_vec();

    for header in request_headers {
        match headers.iter_mut().find(|h| h.is_named(&header.name)) {
            Some(existing) => *existing = header.clone(),
            None => headers.push(header.clone()),
        }
    }

    if !contains_header(&headers, CONTENT_TYPE_HEADER) {
        let content_type = match body {
            AdapterBody::Binary(blob) => blob
                .content_type
                .clone()
                .unwrap_or_else(|| JSON_CONTENT_TYPE.to_string()),
            _ => JSON_CONTENT_TYPE.to_string(),
        };
        headers.push(Header::new(CONTENT_TYPE_HEADER, content_type));
    }

    if let AdapterBody::Binary(blob) = body {
        if !contains_header(&headers, CONTENT_LENGTH_HEADER) {
            headers.push(Header::new(CONTENT_LENGTH_HEADER, blob.len().to_string()));
        }
    }

    if !contains_header(&headers, SDK_ID_HEADER) {
        headers.push(sdk_id_header(sdk_info));
    }

    headers
}

/// Returns true if a `Content-Type` header indicates a JSON body.
pub fn is_json_content(headers: &[Header]) -> bool {
    find_header(headers, CONTENT_TYPE_HEADER)
        .map(|h| h.value.to_ascii_lowercase().contains("json"))
        .unwrap_or(false)
}
