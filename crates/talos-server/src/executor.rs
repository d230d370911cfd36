//! The concurrent request executor.
//!
//! For each request the executor spawns the handler and races its
//! completion against the request deadline and against abnormal
//! termination. Exactly one outcome is committed per request:
//!
//! - the handler's envelope, when it finishes in time
//! - a 408 envelope, when the deadline fires first
//! - a 500 envelope, when the handler panics
//!
//! A handler that outlives its deadline keeps running on the runtime;
//! its eventual result is parked in the discarded join handle and can
//! never block another request.

use std::any::Any;

use bytes::Bytes;
use http::StatusCode;
use talos_core::{Handler, JsonResponse, RawResponse, RequestContext};

/// Which side of the race finished first.
#[derive(Debug)]
enum RaceWinner {
    /// The handler returned an envelope.
    Completed(JsonResponse),

    /// The handler returned `None`, delegating to the raw response slot.
    NoEnvelope,

    /// The deadline elapsed before the handler finished.
    DeadlineElapsed,

    /// The handler task terminated abnormally.
    Panicked(String),
}

/// Races handlers against their deadlines and commits one outcome per
/// request.
///
/// # Example
///
/// ```rust
/// use talos_core::{Handler, JsonResponse, RequestContext};
/// use talos_server::Executor;
///
/// # async fn run() {
/// let executor = Executor::new(vec!["/metrics".to_string()]);
/// let handler = Handler::new(|_ctx| async { Some(JsonResponse::ok()) });
/// let ctx = RequestContext::builder().path("/ping").build();
///
/// let committed = executor.execute(&handler, ctx).await;
/// assert_eq!(committed.status, http::StatusCode::OK);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Executor {
    exempt_paths: Vec<String>,
}

impl Executor {
    /// Creates an executor. Handlers on `exempt_paths` may write the
    /// transport response themselves and return `None`.
    #[must_use]
    pub fn new(exempt_paths: Vec<String>) -> Self {
        Self { exempt_paths }
    }

    /// Returns `true` when the path may bypass the envelope.
    #[must_use]
    pub fn is_exempt(&self, path: &str) -> bool {
        self.exempt_paths.iter().any(|p| p == path)
    }

    /// Runs one handler to a committed outcome.
    ///
    /// The context's deadline bounds the wait, not the handler: a handler
    /// that ignores its deadline keeps running after the 408 is
    /// committed, but nothing ever waits on it again.
    pub async fn execute(&self, handler: &Handler, ctx: RequestContext) -> RawResponse {
        let request_id = ctx.request_id();
        let path = ctx.path().to_string();
        let deadline = ctx.deadline();
        let accepted_at = ctx.accepted_at();
        let slot = ctx.response_slot();
        let exempt = self.is_exempt(ctx.path());

        let fut = handler.call(ctx);
        let mut task = tokio::spawn(fut);

        let winner = tokio::select! {
            joined = &mut task => match joined {
                Ok(Some(resp)) => RaceWinner::Completed(resp),
                Ok(None) => RaceWinner::NoEnvelope,
                Err(e) if e.is_panic() => {
                    RaceWinner::Panicked(panic_message(e.into_panic()))
                }
                Err(e) => RaceWinner::Panicked(e.to_string()),
            },
            () = tokio::time::sleep_until(deadline) => RaceWinner::DeadlineElapsed,
        };

        let latency_ms = accepted_at.elapsed().as_secs_f64() * 1000.0;

        match winner {
            RaceWinner::Completed(mut resp) => {
                resp.set_latency(latency_ms);
                tracing::info!(
                    request_id = %request_id,
                    path = %path,
                    status = resp.status().as_u16(),
                    latency_ms,
                    "request completed"
                );
                RawResponse {
                    status: resp.status(),
                    body: resp.to_bytes(),
                }
            }
            RaceWinner::NoEnvelope if exempt => {
                // The handler owns the transport response on this path.
                // An empty slot still commits something.
                slot.take().unwrap_or(RawResponse {
                    status: StatusCode::OK,
                    body: Bytes::new(),
                })
            }
            RaceWinner::NoEnvelope => {
                tracing::error!(
                    request_id = %request_id,
                    path = %path,
                    "handler returned no envelope on a non-exempt path"
                );
                commit_envelope(internal_error(), latency_ms)
            }
            RaceWinner::DeadlineElapsed => {
                tracing::warn!(
                    request_id = %request_id,
                    path = %path,
                    latency_ms,
                    "request deadline elapsed"
                );
                let resp = JsonResponse::new()
                    .with_status(StatusCode::REQUEST_TIMEOUT)
                    .with_message("Request Timeout");
                commit_envelope(resp, latency_ms)
            }
            RaceWinner::Panicked(payload) => {
                tracing::error!(
                    request_id = %request_id,
                    path = %path,
                    panic = %payload,
                    "handler panicked"
                );
                commit_envelope(internal_error(), latency_ms)
            }
        }
    }
}

fn internal_error() -> JsonResponse {
    JsonResponse::new()
        .with_status(StatusCode::INTERNAL_SERVER_ERROR)
        .with_message("Internal Server Error")
}

fn commit_envelope(mut resp: JsonResponse, latency_ms: f64) -> RawResponse {
    resp.set_latency(latency_ms);
    RawResponse {
        status: resp.status(),
        body: resp.to_bytes(),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
