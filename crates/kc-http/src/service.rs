//! HTTP service: the single path every SDK request takes.
//!
//! Each public operation validates the URL, encodes the body, merges headers
//! and then hands one attempt closure to the retry loop. An attempt invokes
//! the adapter and classifies the response. Operations differ only in how the
//! body of a successful response is decoded.

use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::adapter::{AdapterBody, AdapterRequest, BodyReader, HttpAdapter, ResponseInfo};
use crate::config::{HttpServiceConfig, SdkInfo};
use crate::error::{BoxError, Error, PanicError, ResponseErrorDetails, Result, ValidationError};
use crate::headers::{combined_request_headers, is_json_content, Header};
use crate::request::{
    Blob, DownloadFileOptions, RequestBody, RequestMethod, RequestOptions, UploadFileOptions,
};
use crate::response::{parse_error_payload, HttpResponse, ResponseValidator};
use crate::retry::{execute_with_retry, RetryStrategy};

type Decode<R> = fn(Box<dyn BodyReader>) -> BoxFuture<'static, std::result::Result<R, BoxError>>;

/// A request that passed URL and body validation.
struct PreparedRequest {
    url: String,
    method: RequestMethod,
    body: AdapterBody,
    request_headers: Vec<Header>,
    retry_strategy: Option<RetryStrategy>,
}

/// Executes requests through an adapter with retry and error classification.
///
/// Cloning is cheap; clones share the adapter.
#[derive(Clone)]
pub struct HttpService {
    adapter: Arc<dyn HttpAdapter>,
    request_headers: Vec<Header>,
    retry_strategy: RetryStrategy,
    sdk_info: SdkInfo,
}

impl fmt::Debug for HttpService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpService")
            .field("request_headers", &self.request_headers.len())
            .field("retry_strategy", &self.retry_strategy)
            .field("sdk_info", &self.sdk_info)
            .finish_non_exhaustive()
    }
}

impl HttpService {
    /// Create a service from configuration.
    ///
    /// Without a configured adapter the reqwest adapter is built from
    /// `config.adapter_config`.
    #[cfg(feature = "native")]
    pub fn new(config: HttpServiceConfig) -> Result<Self> {
        let adapter: Arc<dyn HttpAdapter> = match config.adapter.clone() {
            Some(adapter) => adapter,
            None => Arc::new(
                crate::client::ReqwestAdapter::new(config.adapter_config.clone())
                    .map_err(Error::unknown)?,
            ),
        };
        Ok(Self::from_parts(adapter, config))
    }

    /// Create a service from configuration.
    ///
    /// Without the `native` feature an adapter must be configured.
    #[cfg(not(feature = "native"))]
    pub fn new(config: HttpServiceConfig) -> Result<Self> {
        match config.adapter.clone() {
            Some(adapter) => Ok(Self::from_parts(adapter, config)),
            None => Err(Error::unknown("no transport adapter configured")),
        }
    }

    /// Create a service with the default configuration.
    #[cfg(feature = "native")]
    pub fn default_service() -> Result<Self> {
        Self::new(HttpServiceConfig::default())
    }

    /// Create a service around the given adapter.
    ///
    /// Any adapter set in `config` is ignored.
    pub fn with_adapter(adapter: impl HttpAdapter + 'static, config: HttpServiceConfig) -> Self {
        Self::from_parts(Arc::new(adapter), config)
    }

    fn from_parts(adapter: Arc<dyn HttpAdapter>, config: HttpServiceConfig) -> Self {
        Self {
            adapter,
            request_headers: config.request_headers,
            retry_strategy: config.retry_strategy.unwrap_or_default(),
            sdk_info: config.sdk_info,
        }
    }

    /// Service-level headers.
    pub fn request_headers(&self) -> &[Header] {
        &self.request_headers
    }

    /// Service-level retry strategy.
    pub fn retry_strategy(&self) -> &RetryStrategy {
        &self.retry_strategy
    }

    /// Send a JSON request and decode the JSON response into `T`.
    ///
    /// A response that does not decode into `T`, or that the request's
    /// validator rejects, yields a `validationFailed` error. Decoding and
    /// validation run once, after the retry loop.
    #[instrument(skip(self, options), fields(method = %options.method, url = %options.url))]
    pub async fn request<T, B>(&self, options: RequestOptions<B>) -> Result<HttpResponse<T>>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        let RequestOptions {
            url,
            method,
            body,
            request_headers,
            retry_strategy,
            validator,
        } = options;

        validate_url(method, &url)?;

        let body = match body {
            RequestBody::Empty => AdapterBody::Empty,
            RequestBody::Blob(blob) => AdapterBody::Binary(blob),
            RequestBody::Json(value) => match serde_json::to_string(&value) {
                Ok(text) => AdapterBody::Json(text),
                Err(err) => return Err(Error::invalid_body(err).with_request(method, url)),
            },
        };

        let prepared = PreparedRequest {
            url,
            method,
            body,
            request_headers,
            retry_strategy,
        };
        let url = prepared.url.clone();
        let response = self
            .resolve_request::<serde_json::Value>(prepared, |reader| reader.to_json())
            .await?;

        let validator = validator.as_deref();
        let data = decode_json::<T>(&response.data, validator).map_err(|validation| {
            Error::validation_failed(validation, response.data.clone(), url.clone())
                .with_request(method, url.clone())
        })?;

        Ok(response.map(|_| data))
    }

    /// Download a binary resource with `GET`.
    #[instrument(skip(self, options), fields(url = %options.url))]
    pub async fn download_file(&self, options: DownloadFileOptions) -> Result<HttpResponse<Blob>> {
        let DownloadFileOptions {
            url,
            request_headers,
            retry_strategy,
        } = options;
        let method = RequestMethod::Get;

        validate_url(method, &url)?;

        let prepared = PreparedRequest {
            url,
            method,
            body: AdapterBody::Empty,
            request_headers,
            retry_strategy,
        };
        self.resolve_request::<Blob>(prepared, |reader| reader.to_blob())
            .await
    }

    /// Upload a binary payload; the response is decoded as JSON metadata.
    #[instrument(skip(self, options), fields(method = %options.method, url = %options.url))]
    pub async fn upload_file<T>(&self, options: UploadFileOptions) -> Result<HttpResponse<T>>
    where
        T: DeserializeOwned,
    {
        let UploadFileOptions {
            url,
            method,
            body,
            request_headers,
            retry_strategy,
        } = options;

        validate_url(method, &url)?;

        let prepared = PreparedRequest {
            url,
            method,
            body: AdapterBody::Binary(body),
            request_headers,
            retry_strategy,
        };
        let url = prepared.url.clone();
        let response = self
            .resolve_request::<serde_json::Value>(prepared, |reader| reader.to_json())
            .await?;

        let data = decode_json::<T>(&response.data, None).map_err(|validation| {
            Error::validation_failed(validation, response.data.clone(), url.clone())
                .with_request(method, url.clone())
        })?;

        Ok(response.map(|_| data))
    }

    /// Shared pipeline: headers, retry loop, adapter call, classification.
    async fn resolve_request<R>(
        &self,
        request: PreparedRequest,
        decode: Decode<R>,
    ) -> Result<HttpResponse<R>> {
        let PreparedRequest {
            url,
            method,
            body,
            request_headers,
            retry_strategy,
        } = request;

        let headers = combined_request_headers(
            &self.request_headers,
            &request_headers,
            &body,
            &self.sdk_info,
        );
        let strategy = retry_strategy.as_ref().unwrap_or(&self.retry_strategy);

        let adapter_request = AdapterRequest {
            url: url.clone(),
            method,
            request_headers: headers.clone(),
            body: body.clone(),
        };

        let (adapter_response, data) = execute_with_retry(strategy, &url, |attempt| {
            debug!(attempt, "Starting attempt");
            self.attempt(adapter_request.clone(), decode)
        })
        .await?;

        Ok(HttpResponse {
            data,
            body,
            method,
            adapter_response,
            request_headers: headers,
        })
    }

    /// One exchange. Every failure, panics included, becomes an [`Error`].
    async fn attempt<R>(
        &self,
        request: AdapterRequest,
        decode: Decode<R>,
    ) -> Result<(ResponseInfo, R)> {
        let method = request.method;
        let url = request.url.clone();

        let response = guarded(async { self.adapter.call(request).await })
            .await
            .map_err(|e| e.with_request(method, url.clone()))?;
        let (info, reader) = response.into_parts();

        if !info.is_valid_response {
            let kontent_error_response = if is_json_content(&info.response_headers) {
                guarded(async move { reader.to_json().await })
                    .await
                    .ok()
                    .and_then(|body| parse_error_payload(&body))
            } else {
                None
            };

            let details = ResponseErrorDetails {
                is_valid_response: info.is_valid_response,
                status: info.status,
                status_text: info.status_text,
                response_headers: info.response_headers,
                kontent_error_response,
            };
            return Err(Error::from_response(details).with_request(method, url));
        }

        let data = guarded(async move { decode(reader).await })
            .await
            .map_err(|e| e.with_request(method, url))?;
        Ok((info, data))
    }
}

fn validate_url(method: RequestMethod, url: &str) -> Result<()> {
    url::Url::parse(url)
        .map(|_| ())
        .map_err(|err| Error::invalid_url(err).with_request(method, url))
}

fn decode_json<T: DeserializeOwned>(
    data: &serde_json::Value,
    validator: Option<&dyn ResponseValidator>,
) -> std::result::Result<T, ValidationError> {
    if let Some(validator) = validator {
        validator.validate(data)?;
    }
    T::deserialize(data).map_err(ValidationError::from)
}

/// Await a collaborator future, converting errors and panics to `unknown`.
async fn guarded<T, F>(future: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, BoxError>>,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(Error::unknown(err)),
        Err(payload) => Err(Error::unknown(PanicError::from_payload(payload))),
    }
}
