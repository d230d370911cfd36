//! The JSON response envelope.
//!
//! Handlers produce a [`JsonResponse`]; the request executor stamps the
//! latency and writes the envelope to the transport. The serialized form
//! omits absent fields, while `latency` is always present:
//!
//! ```json
//! {"data":{"id":1},"message":"OK","latency":12.4}
//! ```

use bytes::Bytes;
use http::StatusCode;
use serde::Serialize;
use serde_json::Value;

/// The response envelope produced by handlers.
///
/// The status code travels alongside the body but is not serialized into
/// it. Latency is measured and set by the executor; handlers never set it.
///
/// # Example
///
/// ```rust
/// use http::StatusCode;
/// use talos_core::JsonResponse;
///
/// let resp = JsonResponse::new()
///     .with_status(StatusCode::CREATED)
///     .with_message("Created")
///     .with_data(serde_json::json!({"id": 42}));
///
/// assert_eq!(resp.status(), StatusCode::CREATED);
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct JsonResponse {
    /// Response payload, omitted when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,

    /// Human-readable message, omitted when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,

    /// HTTP status code, never serialized into the body.
    #[serde(skip)]
    status: StatusCode,

    /// Structured result, omitted when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,

    /// Wall-clock latency in milliseconds, set by the executor.
    latency: f64,
}

impl JsonResponse {
    /// Creates an empty envelope with status 200.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: None,
            message: None,
            status: StatusCode::OK,
            result: None,
            latency: 0.0,
        }
    }

    /// Sets the response payload.
    ///
    /// Values that fail to serialize are dropped with a warning rather
    /// than failing the request.
    #[must_use]
    pub fn with_data<T: Serialize>(mut self, data: T) -> Self {
        match serde_json::to_value(data) {
            Ok(value) => self.data = Some(value),
            Err(e) => tracing::warn!(error = %e, "failed to serialize response data"),
        }
        self
    }

    /// Sets the human-readable message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the HTTP status code.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Sets the structured result.
    #[must_use]
    pub fn with_result<T: Serialize>(mut self, result: T) -> Self {
        match serde_json::to_value(result) {
            Ok(value) => self.result = Some(value),
            Err(e) => tracing::warn!(error = %e, "failed to serialize response result"),
        }
        self
    }

    /// Stamps the latency in milliseconds.
    ///
    /// Called by the executor when the outcome is committed.
    pub fn set_latency(&mut self, latency_ms: f64) {
        self.latency = latency_ms;
    }

    /// Returns the HTTP status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the stamped latency in milliseconds.
    #[must_use]
    pub fn latency(&self) -> f64 {
        self.latency
    }

    /// Returns the response payload, if set.
    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// Returns the message, if set.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Serializes the envelope into a JSON body.
    ///
    /// Falls back to `{}` if serialization fails, so a committed outcome
    /// is never silently dropped.
    #[must_use]
    pub fn to_bytes(&self) -> Bytes {
        match serde_json::to_vec(self) {
            Ok(body) => Bytes::from(body),
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize response envelope");
                Bytes::from_static(b"{}")
            }
        }
    }

    /// Status 200 with the canonical reason message.
    #[must_use]
    pub fn ok() -> Self {
        Self::canned(StatusCode::OK)
    }

    /// Status 201 with the canonical reason message.
    #[must_use]
    pub fn created() -> Self {
        Self::canned(StatusCode::CREATED)
    }

    /// Status 202 with the canonical reason message.
    #[must_use]
    pub fn accepted() -> Self {
        Self::canned(StatusCode::ACCEPTED)
    }

    /// Status 400 with the canonical reason message.
    #[must_use]
    pub fn bad_request() -> Self {
        Self::canned(StatusCode::BAD_REQUEST)
    }

    /// Status 401 with the canonical reason message.
    #[must_use]
    pub fn unauthorized() -> Self {
        Self::canned(StatusCode::UNAUTHORIZED)
    }

    /// Status 403 with the canonical reason message.
    #[must_use]
    pub fn forbidden() -> Self {
        Self::canned(StatusCode::FORBIDDEN)
    }

    /// Status 407, used by gateways that refuse an upstream credential.
    #[must_use]
    pub fn invalid_authentication() -> Self {
        Self::canned(StatusCode::PROXY_AUTHENTICATION_REQUIRED)
    }

    /// Status 502, the catch-all for unclassified upstream failures.
    #[must_use]
    pub fn unknown_error() -> Self {
        Self::canned(StatusCode::BAD_GATEWAY)
    }

    fn canned(status: StatusCode) -> Self {
        let mut resp = Self::new().with_status(status);
        if let Some(reason) = status.canonical_reason() {
            resp.message = Some(reason.to_string());
        }
        resp
    }
}

impl Default for JsonResponse {
    fn default() -> Self {
        Self::new()
    }
}
