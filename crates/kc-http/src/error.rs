//! Error types for kc-http.
//!
//! Every failure is an [`Error`] whose [`ErrorKind`] is tagged by reason.
//! The service never panics or propagates foreign errors: transport,
//! serialization and reader failures are all folded into a kind.

use std::any::Any;
use std::fmt;

use crate::headers::Header;
use crate::request::RequestMethod;
use crate::response::{sanitize_error_message, KontentErrorResponse};
use crate::retry::RetryStrategy;

/// Boxed error from an injected collaborator.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type alias for kc-http operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for kc-http operations.
#[derive(Debug)]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Method of the failed request, when known.
    pub method: Option<RequestMethod>,
    /// URL of the failed request, when known.
    pub url: Option<String>,
    /// Number of retries performed before giving up.
    pub retry_attempt: u32,
    /// Strategy used by the retry loop, once one has run.
    pub retry_strategy: Option<RetryStrategy>,
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            method: None,
            url: None,
            retry_attempt: 0,
            retry_strategy: None,
        }
    }

    /// Record the request this error belongs to.
    pub fn with_request(mut self, method: RequestMethod, url: impl Into<String>) -> Self {
        self.method = Some(method);
        self.url = Some(url.into());
        self
    }

    /// Classify a non-successful response by status code.
    pub fn from_response(details: ResponseErrorDetails) -> Self {
        let kind = match details.status {
            401 => ErrorKind::Unauthorized(details),
            404 => ErrorKind::NotFound(details),
            _ => ErrorKind::InvalidResponse(details),
        };
        Self::new(kind)
    }

    /// Wrap an unexpected failure.
    pub fn unknown(original_error: impl Into<BoxError>) -> Self {
        Self::new(ErrorKind::Unknown {
            original_error: original_error.into(),
        })
    }

    /// Wrap a URL parse failure.
    pub fn invalid_url(original_error: impl Into<BoxError>) -> Self {
        Self::new(ErrorKind::InvalidUrl {
            original_error: original_error.into(),
        })
    }

    /// Wrap a body serialization failure.
    pub fn invalid_body(original_error: impl Into<BoxError>) -> Self {
        Self::new(ErrorKind::InvalidBody {
            original_error: original_error.into(),
        })
    }

    /// A response body that did not pass validation.
    pub fn validation_failed(
        validation_error: ValidationError,
        response: serde_json::Value,
        url: impl Into<String>,
    ) -> Self {
        let mut err = Self::new(ErrorKind::ValidationFailed {
            validation_error,
            response,
        });
        err.url = Some(url.into());
        err
    }

    /// A paged query finished without a single response.
    pub fn no_responses(url: impl Into<String>) -> Self {
        let mut err = Self::new(ErrorKind::NoResponses);
        err.url = Some(url.into());
        err
    }

    /// The server rejected or did not return a usable continuation token.
    pub fn invalid_continuation_token(token: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidContinuationToken {
            token: token.into(),
        })
    }

    /// The reason discriminant.
    pub fn reason(&self) -> ErrorReason {
        self.kind.reason()
    }

    /// HTTP outcome details for `unauthorized`, `notFound` and `invalidResponse`.
    pub fn response_details(&self) -> Option<&ResponseErrorDetails> {
        match &self.kind {
            ErrorKind::Unauthorized(details)
            | ErrorKind::NotFound(details)
            | ErrorKind::InvalidResponse(details) => Some(details),
            _ => None,
        }
    }

    /// HTTP status, if the error came from a response.
    pub fn status(&self) -> Option<u16> {
        self.response_details().map(|d| d.status)
    }

    /// Structured error payload returned by the server, if any.
    pub fn kontent_error(&self) -> Option<&KontentErrorResponse> {
        self.response_details()?.kontent_error_response.as_ref()
    }

    /// The wrapped error for `invalidBody`, `invalidUrl` and `unknown`.
    pub fn original_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match &self.kind {
            ErrorKind::InvalidBody { original_error }
            | ErrorKind::InvalidUrl { original_error }
            | ErrorKind::Unknown { original_error } => Some(original_error.as_ref()),
            _ => None,
        }
    }

    /// Returns true if the default retry policy would retry this error.
    pub fn is_retryable(&self) -> bool {
        crate::retry::default_can_retry_error(self)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.method, &self.url) {
            (Some(method), Some(url)) => {
                write!(f, "Failed to execute '{}' request '{}'", method, url)?
            }
            (None, Some(url)) => write!(f, "Request '{}' failed", url)?,
            _ => f.write_str("Request failed")?,
        }
        if self.retry_attempt > 0 {
            write!(f, " after {} retry attempt(s)", self.retry_attempt)?;
        }
        write!(f, ". {}", self.kind)?;

        if let Some(payload) = self.kontent_error() {
            if !payload.message.is_empty() {
                write!(f, ". Message: {}", sanitize_error_message(&payload.message))?;
            }
            if let Some(request_id) = &payload.request_id {
                write!(f, " (request id: {})", request_id)?;
            }
            if !payload.validation_errors.is_empty() {
                f.write_str(". Validation errors:")?;
                for (i, item) in payload.validation_errors.iter().enumerate() {
                    let sep = if i == 0 { " " } else { "; " };
                    write!(f, "{}{}", sep, sanitize_error_message(&item.message))?;
                    if let Some(path) = &item.path {
                        write!(f, " at path '{}'", path)?;
                    }
                    if let Some(line) = item.line {
                        write!(f, " line {}", line)?;
                    }
                    if let Some(position) = item.position {
                        write!(f, " position {}", position)?;
                    }
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ErrorKind::InvalidBody { original_error }
            | ErrorKind::InvalidUrl { original_error }
            | ErrorKind::Unknown { original_error } => Some(original_error.as_ref()),
            ErrorKind::ValidationFailed {
                validation_error, ..
            } => Some(validation_error),
            _ => None,
        }
    }
}

/// The kind of error that occurred, tagged by reason.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// HTTP 401.
    #[error("Unauthorized ({} {})", .0.status, .0.status_text)]
    Unauthorized(ResponseErrorDetails),

    /// HTTP 404.
    #[error("Not found ({} {})", .0.status, .0.status_text)]
    NotFound(ResponseErrorDetails),

    /// Any other non-successful response.
    #[error("Invalid response ({} {})", .0.status, .0.status_text)]
    InvalidResponse(ResponseErrorDetails),

    /// The request body could not be serialized.
    #[error("Invalid body: {original_error}")]
    InvalidBody { original_error: BoxError },

    /// The request URL could not be parsed.
    #[error("Invalid URL: {original_error}")]
    InvalidUrl { original_error: BoxError },

    /// Anything unexpected raised by the adapter or a body reader.
    #[error("Unknown error: {original_error}")]
    Unknown { original_error: BoxError },

    /// The response body did not match the expected shape.
    #[error("Response validation failed: {validation_error}")]
    ValidationFailed {
        validation_error: ValidationError,
        response: serde_json::Value,
    },

    /// A paged query collected no responses.
    #[error("No responses were collected")]
    NoResponses,

    /// A continuation token was missing or rejected.
    #[error("Invalid continuation token '{token}'")]
    InvalidContinuationToken { token: String },
}

impl ErrorKind {
    /// The reason discriminant.
    pub fn reason(&self) -> ErrorReason {
        match self {
            ErrorKind::Unauthorized(_) => ErrorReason::Unauthorized,
            ErrorKind::NotFound(_) => ErrorReason::NotFound,
            ErrorKind::InvalidResponse(_) => ErrorReason::InvalidResponse,
            ErrorKind::InvalidBody { .. } => ErrorReason::InvalidBody,
            ErrorKind::InvalidUrl { .. } => ErrorReason::InvalidUrl,
            ErrorKind::Unknown { .. } => ErrorReason::Unknown,
            ErrorKind::ValidationFailed { .. } => ErrorReason::ValidationFailed,
            ErrorKind::NoResponses => ErrorReason::NoResponses,
            ErrorKind::InvalidContinuationToken { .. } => ErrorReason::InvalidContinuationToken,
        }
    }
}

/// Reason discriminant of an [`ErrorKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorReason {
    Unauthorized,
    InvalidResponse,
    InvalidUrl,
    Unknown,
    InvalidBody,
    NotFound,
    ValidationFailed,
    NoResponses,
    InvalidContinuationToken,
}

impl ErrorReason {
    /// Stable camelCase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorReason::Unauthorized => "unauthorized",
            ErrorReason::InvalidResponse => "invalidResponse",
            ErrorReason::InvalidUrl => "invalidUrl",
            ErrorReason::Unknown => "unknown",
            ErrorReason::InvalidBody => "invalidBody",
            ErrorReason::NotFound => "notFound",
            ErrorReason::ValidationFailed => "validationFailed",
            ErrorReason::NoResponses => "noResponses",
            ErrorReason::InvalidContinuationToken => "invalidContinuationToken",
        }
    }
}

impl fmt::Display for ErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP outcome carried by `unauthorized`, `notFound` and `invalidResponse`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseErrorDetails {
    /// Transport-level success flag reported by the adapter.
    pub is_valid_response: bool,
    /// HTTP status code.
    pub status: u16,
    /// HTTP status text.
    pub status_text: String,
    /// Response headers.
    pub response_headers: Vec<Header>,
    /// Structured error payload, when the body was JSON of the known shape.
    pub kontent_error_response: Option<KontentErrorResponse>,
}

/// Response body validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// What did not match.
    pub message: String,
    /// Location in the body, when known.
    pub path: Option<String>,
}

impl ValidationError {
    /// Create a validation error without a location.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
        }
    }

    /// Attach the location of the mismatch.
    pub fn at(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(path) = &self.path {
            write!(f, " (at {})", path)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

impl From<serde_json::Error> for ValidationError {
    fn from(err: serde_json::Error) -> Self {
        let location = format!("line {} column {}", err.line(), err.column());
        let mut validation = ValidationError::new(err.to_string());
        if err.line() > 0 {
            validation = validation.at(location);
        }
        validation
    }
}

/// A panic raised inside an injected adapter or body reader.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("adapter panicked: {message}")]
pub struct PanicError {
    /// Panic payload rendered as text.
    pub message: String,
}

impl PanicError {
    /// Render a panic payload.
    pub fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self { message }
    }
}
