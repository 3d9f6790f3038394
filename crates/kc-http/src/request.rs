//! Per-call request descriptors.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::headers::Header;
use crate::response::ResponseValidator;
use crate::retry::RetryStrategy;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl RequestMethod {
    /// Upper-case method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
            RequestMethod::Put => "PUT",
            RequestMethod::Patch => "PATCH",
            RequestMethod::Delete => "DELETE",
        }
    }

    /// Convert to reqwest::Method.
    #[cfg(feature = "native")]
    pub fn to_reqwest(&self) -> reqwest::Method {
        match self {
            RequestMethod::Get => reqwest::Method::GET,
            RequestMethod::Post => reqwest::Method::POST,
            RequestMethod::Put => reqwest::Method::PUT,
            RequestMethod::Patch => reqwest::Method::PATCH,
            RequestMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binary payload with an optional declared content type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Blob {
    /// Raw bytes.
    pub data: Bytes,
    /// Declared MIME type, if any.
    pub content_type: Option<String>,
}

impl Blob {
    /// Create a blob with no declared content type.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            content_type: None,
        }
    }

    /// Set the declared content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the blob holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Request body.
///
/// `Json` bodies are serialized by the service right before dispatch, so a
/// value that cannot be encoded surfaces as an `invalidBody` error rather
/// than at construction time.
#[derive(Debug, Clone)]
pub enum RequestBody<B = serde_json::Value> {
    Empty,
    Blob(Blob),
    Json(B),
}

/// Options for a JSON request.
#[derive(Clone)]
pub struct RequestOptions<B = serde_json::Value> {
    pub(crate) url: String,
    pub(crate) method: RequestMethod,
    pub(crate) body: RequestBody<B>,
    pub(crate) request_headers: Vec<Header>,
    pub(crate) retry_strategy: Option<RetryStrategy>,
    pub(crate) validator: Option<Arc<dyn ResponseValidator>>,
}

impl<B> fmt::Debug for RequestOptions<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("request_headers", &self.request_headers.len())
            .field("retry_strategy", &self.retry_strategy.is_some())
            .field("validator", &self.validator.is_some())
            .finish_non_exhaustive()
    }
}

impl RequestOptions {
    /// Create a new request without a body.
    pub fn new(method: RequestMethod, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            body: RequestBody::Empty,
            request_headers: Vec::new(),
            retry_strategy: None,
            validator: None,
        }
    }

    /// Create a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(RequestMethod::Get, url)
    }

    /// Create a POST request.
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(RequestMethod::Post, url)
    }

    /// Create a PUT request.
    pub fn put(url: impl Into<String>) -> Self {
        Self::new(RequestMethod::Put, url)
    }

    /// Create a PATCH request.
    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(RequestMethod::Patch, url)
    }

    /// Create a DELETE request.
    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(RequestMethod::Delete, url)
    }
}

impl<B> RequestOptions<B> {
    /// Set a JSON body.
    pub fn json<T>(self, body: T) -> RequestOptions<T> {
        RequestOptions {
            url: self.url,
            method: self.method,
            body: RequestBody::Json(body),
            request_headers: self.request_headers,
            retry_strategy: self.retry_strategy,
            validator: self.validator,
        }
    }

    /// Set a binary body, sent untouched.
    pub fn blob(mut self, blob: Blob) -> Self {
        self.body = RequestBody::Blob(blob);
        self
    }

    /// Add a request-specific header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request_headers.push(Header::new(name, value));
        self
    }

    /// Add several request-specific headers.
    pub fn headers(mut self, headers: impl IntoIterator<Item = Header>) -> Self {
        self.request_headers.extend(headers);
        self
    }

    /// Override the service-level retry strategy for this call.
    pub fn retry_strategy(mut self, strategy: RetryStrategy) -> Self {
        self.retry_strategy = Some(strategy);
        self
    }

    /// Validate the decoded response body before it is returned.
    pub fn validator(mut self, validator: impl ResponseValidator + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Target URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Request method.
    pub fn method(&self) -> RequestMethod {
        self.method
    }
}

/// Options for a file download (always `GET`, no body).
#[derive(Debug, Clone)]
pub struct DownloadFileOptions {
    pub(crate) url: String,
    pub(crate) request_headers: Vec<Header>,
    pub(crate) retry_strategy: Option<RetryStrategy>,
}

impl DownloadFileOptions {
    /// Create download options for the given URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            request_headers: Vec::new(),
            retry_strategy: None,
        }
    }

    /// Add a request-specific header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request_headers.push(Header::new(name, value));
        self
    }

    /// Override the service-level retry strategy for this call.
    pub fn retry_strategy(mut self, strategy: RetryStrategy) -> Self {
        self.retry_strategy = Some(strategy);
        self
    }
}

/// Options for a binary upload. The response is JSON metadata.
#[derive(Debug, Clone)]
pub struct UploadFileOptions {
    pub(crate) url: String,
    pub(crate) method: RequestMethod,
    pub(crate) body: Blob,
    pub(crate) request_headers: Vec<Header>,
    pub(crate) retry_strategy: Option<RetryStrategy>,
}

impl UploadFileOptions {
    /// Create upload options. Uploads default to `POST`.
    pub fn new(url: impl Into<String>, body: Blob) -> Self {
        Self {
            url: url.into(),
            method: RequestMethod::Post,
            body,
            request_headers: Vec::new(),
            retry_strategy: None,
        }
    }

    /// Use a different method (e.g. `PUT`).
    pub fn method(mut self, method: RequestMethod) -> Self {
        self.method = method;
        self
    }

    /// Add a request-specific header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request_headers.push(Header::new(name, value));
        self
    }

    /// Override the service-level retry strategy for this call.
    pub fn retry_strategy(mut self, strategy: RetryStrategy) -> Self {
        self.retry_strategy = Some(strategy);
        self
    }
}
