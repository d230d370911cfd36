//! Per-request context.
//!
//! A [`RequestContext`] represents one inbound request. It is owned by the
//! request executor for the duration of that request and handed to exactly
//! one handler; it is never shared across requests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use uuid::Uuid;

/// Default per-request deadline when the builder does not set one.
const DEFAULT_DEADLINE: Duration = Duration::from_secs(30);

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which makes it suitable for log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A response written directly to the transport by a handler.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: StatusCode,

    /// Response body.
    pub body: Bytes,
}

/// Shared slot for a handler-written transport response.
///
/// On designated routes a handler may write the transport response itself
/// and return `None`. The slot is the channel for that: the handler writes
/// it via [`RequestContext::write_raw`], the executor drains it when the
/// outcome is committed.
#[derive(Debug, Clone, Default)]
pub struct ResponseSlot {
    inner: Arc<Mutex<Option<RawResponse>>>,
}

impl ResponseSlot {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a response into the slot, replacing any previous write.
    pub fn write(&self, status: StatusCode, body: Bytes) {
        if let Ok(mut slot) = self.inner.lock() {
            *slot = Some(RawResponse { status, body });
        }
    }

    /// Takes the written response out of the slot, if any.
    #[must_use]
    pub fn take(&self) -> Option<RawResponse> {
        self.inner.lock().ok().and_then(|mut slot| slot.take())
    }

    /// Returns `true` if a response has been written.
    #[must_use]
    pub fn is_written(&self) -> bool {
        self.inner.lock().map(|slot| slot.is_some()).unwrap_or(false)
    }
}

/// Per-request handle carrying the request data, its deadline, and the
/// raw response slot.
///
/// The deadline doubles as the cancellation signal: well-behaved handlers
/// check [`RequestContext::is_expired`] or budget their work against
/// [`RequestContext::remaining`]. The executor cannot preempt a handler
/// that ignores it; it only stops waiting.
///
/// # Example
///
/// ```rust
/// use http::Method;
/// use talos_core::RequestContext;
///
/// let ctx = RequestContext::builder()
///     .method(Method::GET)
///     .path("/users/42")
///     .route_path("/users/42")
///     .build();
///
/// assert_eq!(ctx.path(), "/users/42");
/// assert!(!ctx.is_expired());
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique identifier for this request.
    request_id: RequestId,

    /// HTTP method.
    method: Method,

    /// Request path as received.
    path: String,

    /// Full registered route path that matched this request.
    route_path: String,

    /// Request headers.
    headers: HeaderMap,

    /// Collected request body.
    body: Bytes,

    /// Remote peer address, when known.
    remote_addr: Option<SocketAddr>,

    /// When the request was accepted; latency is measured from here.
    accepted_at: Instant,

    /// When the request's deadline fires.
    deadline: Instant,

    /// Slot for a handler-written transport response.
    response: ResponseSlot,
}

impl RequestContext {
    /// Creates a context builder.
    #[must_use]
    pub fn builder() -> RequestContextBuilder {
        RequestContextBuilder::new()
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the full registered route path that matched.
    #[must_use]
    pub fn route_path(&self) -> &str {
        &self.route_path
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the collected request body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the remote peer address, when known.
    #[must_use]
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// Returns the instant the request was accepted.
    #[must_use]
    pub fn accepted_at(&self) -> Instant {
        self.accepted_at
    }

    /// Returns the request deadline.
    #[must_use]
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Returns the time remaining before the deadline, zero if elapsed.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Returns `true` once the deadline has elapsed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Writes a transport response directly, bypassing the envelope.
    ///
    /// Only meaningful on designated routes where the handler returns
    /// `None`; anywhere else the executor treats a missing envelope as a
    /// defect.
    pub fn write_raw(&self, status: StatusCode, body: Bytes) {
        self.response.write(status, body);
    }

    /// Returns a handle to the raw response slot.
    ///
    /// Used by the executor to drain handler-written responses.
    #[must_use]
    pub fn response_slot(&self) -> ResponseSlot {
        self.response.clone()
    }
}

/// Builder for [`RequestContext`].
#[derive(Debug, Default)]
pub struct RequestContextBuilder {
    method: Option<Method>,
    path: Option<String>,
    route_path: Option<String>,
    headers: HeaderMap,
    body: Bytes,
    remote_addr: Option<SocketAddr>,
    deadline: Option<Instant>,
}

impl RequestContextBuilder {
    /// Creates a builder with defaults: GET, empty path and body, a
    /// 30-second deadline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets the request path.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the matched route path.
    #[must_use]
    pub fn route_path(mut self, route_path: impl Into<String>) -> Self {
        self.route_path = Some(route_path.into());
        self
    }

    /// Sets the request headers.
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the collected request body.
    #[must_use]
    pub fn body(mut self, body: Bytes) -> Self {
        self.body = body;
        self
    }

    /// Sets the remote peer address.
    #[must_use]
    pub fn remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    /// Sets the deadline as an absolute instant.
    #[must_use]
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets the deadline as a duration from now.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Builds the context. The acceptance instant is taken here; the
    /// deadline timer and the handler start from the same moment.
    #[must_use]
    pub fn build(self) -> RequestContext {
        let now = Instant::now();
        let path = self.path.unwrap_or_default();
        RequestContext {
            request_id: RequestId::new(),
            method: self.method.unwrap_or(Method::GET),
            route_path: self.route_path.unwrap_or_else(|| path.clone()),
            path,
            headers: self.headers,
            body: self.body,
            remote_addr: self.remote_addr,
            accepted_at: now,
            deadline: self.deadline.unwrap_or(now + DEFAULT_DEADLINE),
            response: ResponseSlot::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_unique() {
        let a = RequestId::new();
        let b = RequestId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_builder_defaults() {
        let ctx = RequestContext::builder().build();
        assert_eq!(ctx.method(), &Method::GET);
        assert_eq!(ctx.path(), "");
        assert!(ctx.body().is_empty());
        assert!(ctx.remote_addr().is_none());
        assert!(!ctx.is_expired());
    }

    #[test]
    fn test_route_path_defaults_to_path() {
        let ctx = RequestContext::builder().path("/ping").build();
        assert_eq!(ctx.route_path(), "/ping");
    }

    #[test]
    fn test_builder_fields() {
        let ctx = RequestContext::builder()
            .method(Method::POST)
            .path("/api/v1/items")
            .route_path("/api/v1/items")
            .body(Bytes::from_static(b"{}"))
            .build();

        assert_eq!(ctx.method(), &Method::POST);
        assert_eq!(ctx.path(), "/api/v1/items");
        assert_eq!(ctx.body().as_ref(), b"{}");
    }

    #[test]
    fn test_deadline_from_timeout() {
        let ctx = RequestContext::builder()
            .timeout(Duration::from_millis(50))
            .build();

        assert!(!ctx.is_expired());
        assert!(ctx.remaining() <= Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expires() {
        let ctx = RequestContext::builder()
            .timeout(Duration::from_millis(10))
            .build();

        tokio::time::advance(Duration::from_millis(20)).await;
        assert!(ctx.is_expired());
        assert_eq!(ctx.remaining(), Duration::ZERO);
    }

    #[test]
    fn test_response_slot_roundtrip() {
        let slot = ResponseSlot::new();
        assert!(!slot.is_written());
        assert!(slot.take().is_none());

        slot.write(StatusCode::OK, Bytes::from_static(b"metrics"));
        assert!(slot.is_written());

        let raw = slot.take().unwrap();
        assert_eq!(raw.status, StatusCode::OK);
        assert_eq!(raw.body.as_ref(), b"metrics");

        // Drained after take.
        assert!(slot.take().is_none());
    }

    #[test]
    fn test_write_raw_visible_through_clone() {
        let ctx = RequestContext::builder().path("/metrics").build();
        let slot = ctx.response_slot();

        ctx.write_raw(StatusCode::OK, Bytes::from_static(b"# HELP"));

        let raw = slot.take().unwrap();
        assert_eq!(raw.body.as_ref(), b"# HELP");
    }
}
