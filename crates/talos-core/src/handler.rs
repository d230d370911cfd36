//! The application handler contract.
//!
//! A handler is an async function from [`RequestContext`] to
//! `Option<JsonResponse>`:
//!
//! - `Some(response)` — the executor commits the envelope.
//! - `None` — the handler wrote the transport response itself; this is
//!   only legal on designated routes (e.g. a metrics probe), anywhere
//!   else the executor treats it as a defect.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::RequestContext;
use crate::response::JsonResponse;

/// Boxed future returned by handler invocations.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Option<JsonResponse>> + Send>>;

type HandlerFn = dyn Fn(RequestContext) -> HandlerFuture + Send + Sync;

/// A cheaply clonable application handler.
///
/// Any `Fn(RequestContext) -> impl Future<Output = Option<JsonResponse>>`
/// converts into one.
///
/// # Example
///
/// ```rust
/// use talos_core::{Handler, JsonResponse, RequestContext};
///
/// let handler = Handler::new(|ctx: RequestContext| async move {
///     Some(JsonResponse::ok().with_message(format!("hello from {}", ctx.path())))
/// });
/// ```
#[derive(Clone)]
pub struct Handler {
    f: Arc<HandlerFn>,
}

impl Handler {
    /// Wraps an async function as a handler.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<JsonResponse>> + Send + 'static,
    {
        Self {
            f: Arc::new(move |ctx| Box::pin(f(ctx))),
        }
    }

    /// Invokes the handler with the given context.
    pub fn call(&self, ctx: RequestContext) -> HandlerFuture {
        (self.f)(ctx)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler").finish_non_exhaustive()
    }
}

impl<F, Fut> From<F> for Handler
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<JsonResponse>> + Send + 'static,
{
    fn from(f: F) -> Self {
        Self::new(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[tokio::test]
    async fn test_handler_call() {
        let handler = Handler::new(|_ctx| async { Some(JsonResponse::ok()) });
        let ctx = RequestContext::builder().build();

        let resp = handler.call(ctx).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_handler_sees_context() {
        let handler = Handler::new(|ctx: RequestContext| async move {
            Some(JsonResponse::new().with_message(ctx.path().to_string()))
        });
        let ctx = RequestContext::builder().path("/echo").build();

        let resp = handler.call(ctx).await.unwrap();
        assert_eq!(resp.message(), Some("/echo"));
    }

    #[tokio::test]
    async fn test_handler_returning_none() {
        let handler = Handler::new(|_ctx| async { None });
        let ctx = RequestContext::builder().build();

        assert!(handler.call(ctx).await.is_none());
    }

    #[tokio::test]
    async fn test_handler_clone_shares_function() {
        let handler = Handler::new(|_ctx| async { Some(JsonResponse::created()) });
        let clone = handler.clone();

        let resp = clone.call(RequestContext::builder().build()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_from_closure() {
        let handler: Handler = (|_ctx: RequestContext| async { Some(JsonResponse::ok()) }).into();
        assert!(handler.call(RequestContext::builder().build()).await.is_some());
    }
}
