//! Narrow send-request seam over the HTTP layer.
//!
//! The rest of the crate depends only on the `Transport` trait, so the
//! interceptor and authenticator can be exercised against a stub transport
//! in tests. `HttpTransport` is the reqwest-backed implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method, StatusCode};
use thiserror::Error;
use tracing::debug;

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Marker header telling the interceptor to skip credential attachment for
/// one request. Consumed by the interceptor, never forwarded to the server.
pub const BYPASS_HEADER: &str = "bypass-auth";

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid header value: {0}")]
    InvalidHeader(String),
}

/// An outbound request before credential attachment.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub form: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            form: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Append a form-encoded body field.
    pub fn form(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Attach the session credential.
    /// The scheme is the literal string `Basic <token>` - the API expects an
    /// opaque token here, not RFC 7617 encoding.
    pub fn authorization(self, token: &str) -> Result<Self, TransportError> {
        let value = HeaderValue::from_str(&format!("Basic {}", token))
            .map_err(|e| TransportError::InvalidHeader(e.to_string()))?;
        Ok(self.header(AUTHORIZATION, value))
    }

    /// Mark this single request as exempt from credential attachment.
    pub fn bypass(mut self) -> Self {
        self.headers.insert(
            HeaderName::from_static(BYPASS_HEADER),
            HeaderValue::from_static("true"),
        );
        self
    }

    pub fn has_bypass(&self) -> bool {
        self.headers.contains_key(BYPASS_HEADER)
    }

    pub fn strip_bypass(&mut self) {
        self.headers.remove(BYPASS_HEADER);
    }
}

/// Raw response: status plus undecoded body text.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// reqwest-backed transport.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self
            .client
            .request(request.method, &url)
            .headers(request.headers);
        if !request.form.is_empty() {
            builder = builder.form(&request.form);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(%status, url = %url, "response received");

        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted transport for exercising the client without a network.

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    type Responder = Box<dyn Fn(&ApiRequest) -> ApiResponse + Send + Sync>;

    pub(crate) struct StubTransport {
        responder: Responder,
        pub(crate) requests: Mutex<Vec<ApiRequest>>,
        pub(crate) ping_calls: AtomicUsize,
        pub(crate) delay_ms: u64,
    }

    impl StubTransport {
        pub(crate) fn new(
            responder: impl Fn(&ApiRequest) -> ApiResponse + Send + Sync + 'static,
        ) -> Self {
            Self {
                responder: Box::new(responder),
                requests: Mutex::new(Vec::new()),
                ping_calls: AtomicUsize::new(0),
                delay_ms: 0,
            }
        }

        /// Answer requests from a fixed queue, in order.
        pub(crate) fn sequence(responses: Vec<ApiResponse>) -> Self {
            let queue = Mutex::new(responses);
            Self::new(move |request| {
                let mut queue = queue.lock().expect("response queue poisoned");
                if queue.is_empty() {
                    panic!("stub transport exhausted at {}", request.path);
                }
                queue.remove(0)
            })
        }

        pub(crate) fn with_delay(mut self, delay_ms: u64) -> Self {
            self.delay_ms = delay_ms;
            self
        }

        pub(crate) fn ok(body: &str) -> ApiResponse {
            ApiResponse {
                status: StatusCode::OK,
                body: body.to_string(),
            }
        }

        pub(crate) fn ping_count(&self) -> usize {
            self.ping_calls.load(Ordering::SeqCst)
        }

        pub(crate) fn sent(&self) -> Vec<ApiRequest> {
            self.requests.lock().expect("request log poisoned").clone()
        }
    }

    #[async_trait]
    impl Transport for StubTransport {
        async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
            if request.path.ends_with("/ping") {
                self.ping_calls.fetch_add(1, Ordering::SeqCst);
            }
            let response = (self.responder)(&request);
            self.requests
                .lock()
                .expect("request log poisoned")
                .push(request);
            if self.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            }
            Ok(response)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bypass_marker_round_trip() {
        let mut request = ApiRequest::post("/apiv2student/ping").bypass();
        assert!(request.has_bypass());
        request.strip_bypass();
        assert!(!request.has_bypass());
    }

    #[test]
    fn test_authorization_uses_literal_basic_scheme() {
        let request = ApiRequest::get("/x")
            .authorization("S1")
            .expect("header build failed");
        let value = request.headers.get(AUTHORIZATION).expect("missing header");
        assert_eq!(value.to_str().expect("non-ascii header"), "Basic S1");
    }

    #[test]
    fn test_form_fields_accumulate_in_order() {
        let request = ApiRequest::post("/login").form("code", "abc123").form("dob", "2008-01-01");
        assert_eq!(request.form.len(), 2);
        assert_eq!(request.form[0].0, "code");
    }
}
