#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use kontent_core_sdk::http::{
    AdapterRequest, AdapterResponse, BodyReader, BoxError, BufferedBody, Header, HttpAdapter,
    ResponseInfo,
};
use kontent_core_sdk::{HttpService, HttpServiceConfig};

pub const ITEMS_URL: &str = "https://deliver.kontent.ai/975bf280-fd91-488c-994c-2f04416e5ee3/items";

/// Install a test subscriber once; honors `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// What the mock transport does on one call.
#[derive(Clone)]
pub enum MockReply {
    /// Complete exchange with a status, headers and raw body.
    Status {
        status: u16,
        headers: Vec<Header>,
        body: Vec<u8>,
    },
    /// Transport failure before any response.
    Fail(Arc<dyn Fn() -> BoxError + Send + Sync>),
    /// Successful status whose JSON reader fails.
    BrokenJson(Arc<dyn Fn() -> BoxError + Send + Sync>),
}

impl MockReply {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        MockReply::Status {
            status,
            headers: vec![Header::new("Content-Type", "application/json; charset=utf-8")],
            body: body.to_string().into_bytes(),
        }
    }

    pub fn status(status: u16) -> Self {
        MockReply::Status {
            status,
            headers: vec![],
            body: vec![],
        }
    }

    pub fn with_header(self, name: &str, value: &str) -> Self {
        match self {
            MockReply::Status {
                status,
                mut headers,
                body,
            } => {
                headers.push(Header::new(name, value));
                MockReply::Status {
                    status,
                    headers,
                    body,
                }
            }
            other => other,
        }
    }
}

/// Scripted in-memory transport that counts its invocations.
///
/// Replies are consumed in order; the last one repeats.
#[derive(Clone)]
pub struct MockAdapter {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    calls: Arc<AtomicU32>,
    requests: Arc<Mutex<Vec<AdapterRequest>>>,
}

impl MockAdapter {
    pub fn new(replies: Vec<MockReply>) -> Self {
        assert!(!replies.is_empty(), "a mock adapter needs at least one reply");
        Self {
            replies: Arc::new(Mutex::new(replies.into())),
            calls: Arc::new(AtomicU32::new(0)),
            requests: Arc::default(),
        }
    }

    pub fn always(reply: MockReply) -> Self {
        Self::new(vec![reply])
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<AdapterRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn service(&self) -> HttpService {
        self.service_with(HttpServiceConfig::default())
    }

    pub fn service_with(&self, config: HttpServiceConfig) -> HttpService {
        HttpService::with_adapter(self.clone(), config)
    }

    fn next_reply(&self) -> MockReply {
        let mut replies = self.replies.lock().unwrap();
        if replies.len() > 1 {
            replies.pop_front().unwrap()
        } else {
            replies[0].clone()
        }
    }
}

struct FailingReader(Arc<dyn Fn() -> BoxError + Send + Sync>);

impl BodyReader for FailingReader {
    fn to_json(self: Box<Self>) -> BoxFuture<'static, Result<serde_json::Value, BoxError>> {
        Box::pin(futures::future::err::<serde_json::Value, BoxError>((self.0)()))
    }

    fn to_blob(self: Box<Self>) -> BoxFuture<'static, Result<kontent_core_sdk::Blob, BoxError>> {
        Box::pin(futures::future::err::<kontent_core_sdk::Blob, BoxError>((self.0)()))
    }
}

impl HttpAdapter for MockAdapter {
    fn call(&self, request: AdapterRequest) -> BoxFuture<'_, Result<AdapterResponse, BoxError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let url = request.url.clone();
        self.requests.lock().unwrap().push(request);
        let reply = self.next_reply();

        Box::pin(async move {
            let (status, headers, reader): (u16, Vec<Header>, Box<dyn BodyReader>) = match reply {
                MockReply::Status {
                    status,
                    headers,
                    body,
                } => {
                    let content_type = headers
                        .iter()
                        .find(|h| h.is_named("content-type"))
                        .map(|h| h.value.clone());
                    let reader =
                        Box::new(BufferedBody::new(body, content_type)) as Box<dyn BodyReader>;
                    (status, headers, reader)
                }
                MockReply::Fail(make_error) => return Err(make_error()),
                MockReply::BrokenJson(make_error) => {
                    (200, vec![], Box::new(FailingReader(make_error)) as Box<dyn BodyReader>)
                }
            };

            let info = ResponseInfo {
                is_valid_response: (200..300).contains(&status),
                status,
                status_text: String::new(),
                response_headers: headers,
                url,
            };
            Ok(AdapterResponse::new(info, reader))
        })
    }
}
