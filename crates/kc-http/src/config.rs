//! Service and adapter configuration.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::adapter::HttpAdapter;
use crate::headers::Header;
use crate::retry::RetryStrategy;

/// Identification sent in the `X-KC-SDKID` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkInfo {
    /// Package registry host.
    pub host: String,
    /// Package name.
    pub name: String,
    /// Package version.
    pub version: String,
}

impl SdkInfo {
    /// Create SDK info.
    pub fn new(
        host: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            name: name.into(),
            version: version.into(),
        }
    }
}

impl Default for SdkInfo {
    fn default() -> Self {
        Self::new(
            crate::SDK_HOST,
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
        )
    }
}

/// Configuration for the HTTP service.
///
/// Built once and shared read-only; per-call options take precedence.
#[derive(Clone, Default)]
pub struct HttpServiceConfig {
    /// Transport adapter; the reqwest adapter is used when absent.
    pub adapter: Option<Arc<dyn HttpAdapter>>,
    /// Headers sent with every request.
    pub request_headers: Vec<Header>,
    /// Retry strategy used when a call does not provide its own.
    pub retry_strategy: Option<RetryStrategy>,
    /// SDK identification.
    pub sdk_info: SdkInfo,
    /// Settings for the default adapter.
    pub adapter_config: AdapterConfig,
}

impl fmt::Debug for HttpServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpServiceConfig")
            .field("adapter", &self.adapter.as_ref().map(|_| "custom"))
            .field("request_headers", &self.request_headers.len())
            .field("retry_strategy", &self.retry_strategy)
            .field("sdk_info", &self.sdk_info)
            .field("adapter_config", &self.adapter_config)
            .finish()
    }
}

impl HttpServiceConfig {
    /// Create a new service config builder.
    pub fn builder() -> HttpServiceConfigBuilder {
        HttpServiceConfigBuilder::default()
    }
}

/// Builder for HttpServiceConfig.
#[derive(Debug, Default)]
pub struct HttpServiceConfigBuilder {
    config: HttpServiceConfig,
}

impl HttpServiceConfigBuilder {
    /// Use a custom transport adapter.
    pub fn with_adapter(mut self, adapter: impl HttpAdapter + 'static) -> Self {
        self.config.adapter = Some(Arc::new(adapter));
        self
    }

    /// Use a shared transport adapter.
    pub fn with_shared_adapter(mut self, adapter: Arc<dyn HttpAdapter>) -> Self {
        self.config.adapter = Some(adapter);
        self
    }

    /// Add a header sent with every request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.request_headers.push(Header::new(name, value));
        self
    }

    /// Add headers sent with every request.
    pub fn with_headers(mut self, headers: impl IntoIterator<Item = Header>) -> Self {
        self.config.request_headers.extend(headers);
        self
    }

    /// Send `Authorization: Bearer <api_key>` with every request.
    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.config
            .request_headers
            .push(crate::headers::authorization_header(api_key));
        self
    }

    /// Set the service-level retry strategy.
    pub fn with_retry(mut self, retry: RetryStrategy) -> Self {
        self.config.retry_strategy = Some(retry);
        self
    }

    /// Disable retries.
    pub fn without_retry(mut self) -> Self {
        self.config.retry_strategy = Some(RetryStrategy::no_retry());
        self
    }

    /// Set the SDK identification.
    pub fn with_sdk_info(mut self, sdk_info: SdkInfo) -> Self {
        self.config.sdk_info = sdk_info;
        self
    }

    /// Set the default adapter settings.
    pub fn with_adapter_config(mut self, adapter_config: AdapterConfig) -> Self {
        self.config.adapter_config = adapter_config;
        self
    }

    /// Build the service configuration.
    pub fn build(self) -> HttpServiceConfig {
        self.config
    }
}

/// Settings for the default reqwest adapter.
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    /// Request timeout.
    pub timeout: Duration,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// User-Agent header value.
    pub user_agent: String,
    /// Accept gzip/deflate encoded responses.
    pub accept_compressed: bool,
    /// Whether to enable request/response tracing.
    pub enable_tracing: bool,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: crate::USER_AGENT.to_string(),
            accept_compressed: true,
            enable_tracing: true,
        }
    }
}

impl AdapterConfig {
    /// Set request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set custom User-Agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Enable or disable compressed responses.
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.accept_compressed = enabled;
        self
    }

    /// Enable or disable request/response tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}
