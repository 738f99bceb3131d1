//! Transport layer with fault injection.

use crate::config::FaultConfig;
use crate::error::{SyncError, SyncResult};
use crate::http::{HttpClient, HttpMethod, HttpRequest};
use crate::random::{RandomSource, ThreadRandom};
use async_trait::async_trait;
use cardsync_protocol::FlashCard;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// A transport sends requests to the card resource and parses the reply.
///
/// This trait is the only network-facing primitive of the engine. It never
/// retries; retry policy belongs to the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a request.
    ///
    /// Returns the parsed JSON body, or `None` when the body is empty.
    /// Non-2xx statuses and malformed JSON fail with a transport error.
    async fn send(&self, request: HttpRequest) -> SyncResult<Option<Value>>;
}

/// Transport that wraps an [`HttpClient`] with optional artificial latency
/// and simulated failure.
///
/// For each request the transport draws from its random source:
/// 1. if latency is on, one draw scales `max_latency` into the delay;
/// 2. after the delay, if failure is on, one draw below `failure_rate`
///    fails the request before it reaches the client.
pub struct FaultInjectingTransport<C: HttpClient, R: RandomSource = ThreadRandom> {
    client: C,
    fault: FaultConfig,
    random: R,
}

impl<C: HttpClient> FaultInjectingTransport<C, ThreadRandom> {
    /// Creates a transport drawing from the thread RNG.
    pub fn new(client: C, fault: FaultConfig) -> Self {
        Self::with_random(client, fault, ThreadRandom)
    }
}

impl<C: HttpClient, R: RandomSource> FaultInjectingTransport<C, R> {
    /// Creates a transport with an explicit random source.
    pub fn with_random(client: C, fault: FaultConfig, random: R) -> Self {
        Self {
            client,
            fault,
            random,
        }
    }

    /// Returns the fault configuration.
    pub fn fault(&self) -> &FaultConfig {
        &self.fault
    }

    /// Returns the wrapped client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Returns the random source.
    pub fn random(&self) -> &R {
        &self.random
    }

    fn draw_latency(&self) -> Option<Duration> {
        if !self.fault.simulate_latency {
            return None;
        }
        Some(self.fault.max_latency.mul_f64(self.random.next_f64()))
    }

    fn draw_failure(&self) -> bool {
        self.fault.simulate_failure && self.random.next_f64() < self.fault.failure_rate
    }
}

#[async_trait]
impl<C: HttpClient, R: RandomSource> Transport for FaultInjectingTransport<C, R> {
    async fn send(&self, request: HttpRequest) -> SyncResult<Option<Value>> {
        let method = request.method;
        let url = request.url.clone();

        if let Some(delay) = self.draw_latency() {
            debug!(%method, %url, delay_ms = delay.as_millis() as u64, "injecting latency");
            tokio::time::sleep(delay).await;
        }

        if self.draw_failure() {
            warn!(%method, %url, "injecting failure");
            return Err(SyncError::transport_retryable(format!(
                "simulated failure for {method} {url}"
            )));
        }

        debug!(%method, %url, "sending request");
        let response = self
            .client
            .execute(request)
            .await
            .map_err(SyncError::transport_retryable)?;

        if !response.is_success() {
            return Err(SyncError::http_status(
                response.status,
                format!("{method} {url} returned {}", response.status),
            ));
        }

        parse_body(&response.body)
    }
}

/// Parses a response body; empty bodies yield `None`.
fn parse_body(body: &[u8]) -> SyncResult<Option<Value>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| SyncError::transport_fatal(format!("malformed JSON response: {e}")))
}

/// A scripted transport for testing.
///
/// Every request is recorded when it is sent, before any configured delay,
/// so tests can count network calls while they are still outstanding.
#[derive(Debug, Default)]
pub struct MockTransport {
    requests: Mutex<Vec<HttpRequest>>,
    list_body: Mutex<Option<Value>>,
    failing: AtomicBool,
    fail_next: AtomicUsize,
    delay: Mutex<Duration>,
}

impl MockTransport {
    /// Creates a new mock transport that answers successfully.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the cards returned by `GET` requests.
    pub fn set_cards(&self, cards: &[FlashCard]) {
        *self.list_body.lock() = serde_json::to_value(cards).ok();
    }

    /// Sets the raw JSON returned by `GET` requests.
    pub fn set_list_body(&self, body: Value) {
        *self.list_body.lock() = Some(body);
    }

    /// Makes every request fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Makes the next `count` requests fail.
    pub fn fail_next(&self, count: usize) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    /// Delays every response.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    /// Returns all recorded requests.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    /// Returns the number of recorded requests.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Returns the number of recorded requests with the given method.
    pub fn count(&self, method: HttpMethod) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.method == method)
            .count()
    }

    fn take_failure(&self) -> bool {
        if self.failing.load(Ordering::SeqCst) {
            return true;
        }
        self.fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> SyncResult<Option<Value>> {
        let method = request.method;
        self.requests.lock().push(request);

        let delay = *self.delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.take_failure() {
            return Err(SyncError::transport_retryable("mock failure"));
        }

        match method {
            HttpMethod::Get => Ok(Some(
                self.list_body
                    .lock()
                    .clone()
                    .unwrap_or_else(|| Value::Array(Vec::new())),
            )),
            _ => Ok(None),
        }
    }
}
