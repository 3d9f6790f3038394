//! Default transport adapter backed by reqwest.

use futures::future::BoxFuture;
use tracing::{debug, info};

use crate::adapter::{
    AdapterBody, AdapterRequest, AdapterResponse, BodyReader, HttpAdapter, ResponseInfo,
};
use crate::config::AdapterConfig;
use crate::error::BoxError;
use crate::headers::{Header, CONTENT_TYPE_HEADER};
use crate::request::Blob;

/// HTTP adapter wrapping a `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestAdapter {
    inner: reqwest::Client,
    config: AdapterConfig,
}

impl ReqwestAdapter {
    /// Create a new adapter.
    pub fn new(config: AdapterConfig) -> reqwest::Result<Self> {
        let builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .gzip(config.accept_compressed)
            .deflate(config.accept_compressed);

        let inner = builder.build()?;
        Ok(Self { inner, config })
    }

    /// Create an adapter with the default configuration.
    pub fn default_adapter() -> reqwest::Result<Self> {
        Self::new(AdapterConfig::default())
    }

    /// Wrap an existing reqwest client.
    pub fn from_client(inner: reqwest::Client) -> Self {
        Self {
            inner,
            config: AdapterConfig::default(),
        }
    }

    /// Get the adapter configuration.
    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    async fn execute(&self, request: AdapterRequest) -> Result<AdapterResponse, BoxError> {
        let mut req = self
            .inner
            .request(request.method.to_reqwest(), request.url.as_str());

        for header in &request.request_headers {
            req = req.header(header.name.as_str(), header.value.as_str());
        }

        req = match request.body {
            AdapterBody::Empty => req,
            AdapterBody::Json(text) => req.body(text),
            AdapterBody::Binary(blob) => req.body(blob.data),
        };

        if self.config.enable_tracing {
            debug!(method = %request.method, url = %request.url, "Sending request");
        }

        let response = req.send().await?;
        let status = response.status();

        if self.config.enable_tracing {
            let content_length = response.content_length();
            if status.is_success() {
                debug!(status = status.as_u16(), content_length, "Response received");
            } else {
                info!(status = status.as_u16(), content_length, "Non-success response");
            }
        }

        let response_headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| Header::new(name.as_str(), value))
            })
            .collect();

        let info = ResponseInfo {
            is_valid_response: status.is_success(),
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            response_headers,
            url: response.url().to_string(),
        };

        Ok(AdapterResponse::new(info, Box::new(ReqwestBody { response })))
    }
}

impl HttpAdapter for ReqwestAdapter {
    fn call(&self, request: AdapterRequest) -> BoxFuture<'_, Result<AdapterResponse, BoxError>> {
        Box::pin(self.execute(request))
    }
}

struct ReqwestBody {
    response: reqwest::Response,
}

impl BodyReader for ReqwestBody {
    fn to_json(self: Box<Self>) -> BoxFuture<'static, Result<serde_json::Value, BoxError>> {
        Box::pin(read_json(self.response))
    }

    fn to_blob(self: Box<Self>) -> BoxFuture<'static, Result<Blob, BoxError>> {
        Box::pin(read_blob(self.response))
    }
}

async fn read_json(response: reqwest::Response) -> Result<serde_json::Value, BoxError> {
    let bytes = response.bytes().await?;
    // 204 and friends carry no body
    if bytes.is_empty() {
        return Ok(serde_json::Value::Null);
    }
    Ok(serde_json::from_slice(&bytes)?)
}

async fn read_blob(response: reqwest::Response) -> Result<Blob, BoxError> {
    let content_type = response
        .headers()
        .get(CONTENT_TYPE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let data = response.bytes().await?;
    Ok(Blob { data, content_type })
}
