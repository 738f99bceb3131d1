//! HTTP client seam.
//!
//! The transport talks to the network through the [`HttpClient`] trait so
//! the actual HTTP library can be swapped. [`ReqwestClient`] is the real
//! implementation; [`LoopbackClient`] routes requests to an in-process
//! handler and is used by tests.

use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// HTTP methods used by the card resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl HttpMethod {
    /// Returns the method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Returns true for methods that change server state.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, HttpMethod::Get)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outbound HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Method.
    pub method: HttpMethod,
    /// Absolute URL.
    pub url: String,
    /// Header name/value pairs.
    pub headers: Vec<(String, String)>,
    /// Request body.
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Creates a request with no headers and no body.
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Attaches a JSON body and its `Content-Type` header.
    pub fn with_json_body(mut self, body: Vec<u8>) -> Self {
        self.headers
            .push(("Content-Type".to_string(), "application/json".to_string()));
        self.body = Some(body);
        self
    }

    /// Returns a header value, matching the name case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the path component of the URL.
    pub fn path(&self) -> &str {
        match self.url.split_once("://") {
            Some((_, rest)) => rest.find('/').map(|i| &rest[i..]).unwrap_or("/"),
            None => &self.url,
        }
    }
}

/// A raw HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response.
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self { status, body }
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual network call. Errors are
/// connection-level failures; non-2xx responses are returned as `Ok`.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends a request and returns the response.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, String>;
}

/// [`HttpClient`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a client with the given request timeout.
    pub fn new(timeout: Duration) -> SyncResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::transport_fatal(format!("failed to build client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, String> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| e.to_string())?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| e.to_string())?;

        Ok(HttpResponse::new(status, body.to_vec()))
    }
}

/// Trait for in-process handlers that can answer loopback requests.
pub trait LoopbackServer: Send + Sync {
    /// Handles a request and returns the response.
    fn handle(&self, request: &HttpRequest) -> HttpResponse;
}

impl<S: LoopbackServer + ?Sized> LoopbackServer for Arc<S> {
    fn handle(&self, request: &HttpRequest) -> HttpResponse {
        (**self).handle(request)
    }
}

/// A loopback HTTP client that routes requests directly to a handler.
///
/// Useful for testing without actual network overhead. The client can be
/// taken offline to simulate connection failures.
pub struct LoopbackClient<S: LoopbackServer> {
    server: S,
    online: AtomicBool,
    requests: AtomicUsize,
}

impl<S: LoopbackServer> LoopbackClient<S> {
    /// Creates a new loopback client connected to the given server.
    pub fn new(server: S) -> Self {
        Self {
            server,
            online: AtomicBool::new(true),
            requests: AtomicUsize::new(0),
        }
    }

    /// Takes the client online or offline.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Number of requests that reached the server.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Returns the underlying server.
    pub fn server(&self) -> &S {
        &self.server
    }
}

#[async_trait]
impl<S: LoopbackServer> HttpClient for LoopbackClient<S> {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, String> {
        if !self.online.load(Ordering::SeqCst) {
            return Err("connection refused".into());
        }
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(self.server.handle(&request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoServer;

    impl LoopbackServer for EchoServer {
        fn handle(&self, request: &HttpRequest) -> HttpResponse {
            HttpResponse::new(200, request.path().as_bytes().to_vec())
        }
    }

    #[test]
    fn request_path() {
        let req = HttpRequest::new(HttpMethod::Get, "http://localhost:3003/flash-cards/abc");
        assert_eq!(req.path(), "/flash-cards/abc");

        let req = HttpRequest::new(HttpMethod::Get, "http://localhost:3003");
        assert_eq!(req.path(), "/");

        let req = HttpRequest::new(HttpMethod::Get, "/flash-cards");
        assert_eq!(req.path(), "/flash-cards");
    }

    #[test]
    fn json_body_sets_content_type() {
        let req = HttpRequest::new(HttpMethod::Post, "http://h/flash-cards")
            .with_json_body(b"{}".to_vec());
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.body.as_deref(), Some(&b"{}"[..]));

        let req = HttpRequest::new(HttpMethod::Delete, "http://h/flash-cards/1");
        assert_eq!(req.header("Content-Type"), None);
    }

    #[test]
    fn response_success_range() {
        assert!(HttpResponse::new(200, vec![]).is_success());
        assert!(HttpResponse::new(204, vec![]).is_success());
        assert!(!HttpResponse::new(301, vec![]).is_success());
        assert!(!HttpResponse::new(404, vec![]).is_success());
    }

    #[test]
    fn method_names() {
        assert_eq!(HttpMethod::Patch.to_string(), "PATCH");
        assert!(HttpMethod::Delete.is_mutating());
        assert!(!HttpMethod::Get.is_mutating());
    }

    #[tokio::test]
    async fn loopback_routes_to_server() {
        let client = LoopbackClient::new(EchoServer);
        let req = HttpRequest::new(HttpMethod::Get, "http://localhost/flash-cards");

        let response = client.execute(req).await.unwrap();
        assert_eq!(response.body, b"/flash-cards");
        assert_eq!(client.request_count(), 1);
    }

    #[tokio::test]
    async fn loopback_offline() {
        let client = LoopbackClient::new(EchoServer);
        client.set_online(false);

        let req = HttpRequest::new(HttpMethod::Get, "http://localhost/flash-cards");
        assert!(client.execute(req).await.is_err());
        assert_eq!(client.request_count(), 0);
    }
}
