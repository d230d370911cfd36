//! Server lifecycle.
//!
//! [`Server`] sequences the pieces: bind the [`GracefulListener`], run
//! the accept loop with one task per connection, dispatch each request
//! through the route table and the [`Executor`], and on a shutdown
//! signal perform the ordered teardown — disable keep-alive, nudge
//! in-flight connections, drain the listener within the grace period.

use std::convert::Infallible;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use http::{Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use talos_core::{JsonResponse, RawResponse, RequestContext};
use talos_router::Router;
use thiserror::Error;
use tokio::net::TcpStream;

use crate::config::ServerConfig;
use crate::executor::Executor;
use crate::listener::{DrainOutcome, GracefulListener};
use crate::shutdown::{ConnectionToken, ShutdownSignal};

/// Body type for all server responses.
pub type ResponseBody = Full<Bytes>;

/// Response type produced by the dispatch path.
pub type HttpResponse = Response<ResponseBody>;

/// Errors surfaced by the server lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured bind address could not be parsed.
    #[error("invalid bind address {addr:?}")]
    InvalidAddr {
        /// The address as configured.
        addr: String,
        /// The parse failure.
        #[source]
        source: std::net::AddrParseError,
    },

    /// The listener could not bind. Fatal: the service cannot serve
    /// without its address, callers exit.
    #[error("failed to bind {addr}")]
    Bind {
        /// The address that failed to bind.
        addr: SocketAddr,
        /// The bind error.
        #[source]
        source: io::Error,
    },

    /// An I/O error outside bind.
    #[error("server i/o error")]
    Io(#[from] io::Error),
}

/// The dispatch state shared by every connection task.
#[derive(Debug)]
struct ServerInner {
    config: ServerConfig,
    router: Router,
    executor: Executor,

    /// Cleared at shutdown so new connections are not kept alive.
    keep_alive: AtomicBool,
}

/// A configured, not-yet-bound server.
///
/// # Example
///
/// ```rust,no_run
/// use talos_core::{JsonResponse, RequestContext};
/// use talos_router::Router;
/// use talos_server::{Server, ServerConfig};
///
/// # async fn run() -> Result<(), talos_server::ServerError> {
/// let mut router = Router::new();
/// router.get("/ping", |_: RequestContext| async { Some(JsonResponse::ok()) });
///
/// let server = Server::builder()
///     .config(ServerConfig::builder().addr("0.0.0.0:8080").build())
///     .router(router)
///     .build();
///
/// server.run().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    router: Router,
}

impl Server {
    /// Creates a server builder.
    #[must_use]
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    /// Binds the listener.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::InvalidAddr`] when the configured address
    /// does not parse, [`ServerError::Bind`] when the bind itself fails.
    pub async fn bind(self) -> Result<BoundServer, ServerError> {
        let addr = self
            .config
            .socket_addr()
            .map_err(|source| ServerError::InvalidAddr {
                addr: self.config.addr().to_string(),
                source,
            })?;

        let listener = GracefulListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        tracing::info!(
            service = self.config.service_name(),
            addr = %listener.local_addr(),
            routes = self.router.len(),
            "server listening"
        );

        let executor = Executor::new(self.config.exempt_paths().to_vec());
        Ok(BoundServer {
            listener,
            conn_shutdown: ShutdownSignal::new(),
            inner: Arc::new(ServerInner {
                config: self.config,
                router: self.router,
                executor,
                keep_alive: AtomicBool::new(true),
            }),
        })
    }

    /// Binds and serves until a termination signal arrives.
    ///
    /// # Errors
    ///
    /// Returns bind failures; serve errors are handled per connection.
    pub async fn run(self) -> Result<DrainOutcome, ServerError> {
        let bound = self.bind().await?;
        bound.serve(ShutdownSignal::with_os_signals()).await
    }
}

/// Builder for [`Server`].
#[derive(Debug, Default)]
pub struct ServerBuilder {
    config: ServerConfig,
    router: Router,
}

impl ServerBuilder {
    /// Sets the server configuration.
    #[must_use]
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the route table.
    #[must_use]
    pub fn router(mut self, router: Router) -> Self {
        self.router = router;
        self
    }

    /// Builds the server.
    #[must_use]
    pub fn build(self) -> Server {
        Server {
            config: self.config,
            router: self.router,
        }
    }
}

/// A server whose listener is bound and ready to serve.
#[derive(Debug)]
pub struct BoundServer {
    listener: GracefulListener,
    conn_shutdown: ShutdownSignal,
    inner: Arc<ServerInner>,
}

impl BoundServer {
    /// Returns the bound address.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }

    /// Runs the accept loop until `shutdown` triggers, then drains.
    ///
    /// Shutdown order: stop accepting, clear keep-alive, tell in-flight
    /// connections to finish their current request, wait for the drain
    /// bounded by the configured grace period.
    ///
    /// # Errors
    ///
    /// Accept errors are logged and retried, not returned; the only
    /// errors surfaced are I/O failures tearing down the listener.
    pub async fn serve(mut self, shutdown: ShutdownSignal) -> Result<DrainOutcome, ServerError> {
        loop {
            tokio::select! {
                () = shutdown.recv() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok(Some((stream, peer, token))) => {
                        let inner = Arc::clone(&self.inner);
                        let conn_shutdown = self.conn_shutdown.clone();
                        tokio::spawn(handle_connection(
                            stream,
                            peer,
                            token,
                            inner,
                            conn_shutdown,
                        ));
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!(error = %e, "accept failed");
                    }
                },
            }
        }

        self.inner.keep_alive.store(false, Ordering::SeqCst);
        self.conn_shutdown.trigger();

        let grace = self.inner.config.shutdown_grace();
        let outcome = self.listener.shutdown(grace).await;
        match outcome {
            DrainOutcome::Drained => tracing::info!("server drained and stopped"),
            DrainOutcome::GraceExpired { active } => {
                tracing::warn!(active, "server stopped with connections severed");
            }
        }
        Ok(outcome)
    }
}

/// Serves one connection to completion or forced cutoff.
async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    token: ConnectionToken,
    inner: Arc<ServerInner>,
    shutdown: ShutdownSignal,
) {
    let keep_alive = inner.keep_alive.load(Ordering::SeqCst);
    let service = service_fn(move |req| {
        let inner = Arc::clone(&inner);
        async move { Ok::<_, Infallible>(handle_request(req, peer, &inner).await) }
    });

    let conn = http1::Builder::new()
        .keep_alive(keep_alive)
        .serve_connection(TokioIo::new(stream), service);
    tokio::pin!(conn);

    let mut shutdown_rx = shutdown.recv();
    let mut draining = false;
    loop {
        tokio::select! {
            result = conn.as_mut() => {
                if let Err(e) = result {
                    tracing::debug!(peer = %peer, error = %e, "connection closed with error");
                }
                break;
            }
            () = &mut shutdown_rx, if !draining => {
                draining = true;
                conn.as_mut().graceful_shutdown();
            }
        }
    }

    drop(token);
}

/// Dispatches one request: route lookup, body collection, executor race.
async fn handle_request(
    req: Request<Incoming>,
    peer: SocketAddr,
    inner: &ServerInner,
) -> HttpResponse {
    let (parts, incoming) = req.into_parts();
    let method = parts.method;
    let path = parts.uri.path().to_string();

    let Some(handler) = inner.router.lookup(&method, &path) else {
        let resp = JsonResponse::new()
            .with_status(StatusCode::NOT_FOUND)
            .with_message("Not Found");
        return envelope_response(&RawResponse {
            status: resp.status(),
            body: resp.to_bytes(),
        });
    };
    let handler = handler.clone();

    let read_timeout = inner.config.read_timeout();
    let body = match tokio::time::timeout(read_timeout, incoming.collect()).await {
        Ok(Ok(collected)) => collected.to_bytes(),
        Ok(Err(e)) => {
            tracing::warn!(path = %path, error = %e, "failed to read request body");
            let resp = JsonResponse::bad_request();
            return envelope_response(&RawResponse {
                status: resp.status(),
                body: resp.to_bytes(),
            });
        }
        Err(_) => {
            tracing::warn!(path = %path, "request body read timed out");
            let resp = JsonResponse::new()
                .with_status(StatusCode::REQUEST_TIMEOUT)
                .with_message("Request Timeout");
            return envelope_response(&RawResponse {
                status: resp.status(),
                body: resp.to_bytes(),
            });
        }
    };

    let ctx = RequestContext::builder()
        .method(method)
        .path(&path)
        .route_path(&path)
        .headers(parts.headers)
        .body(body)
        .remote_addr(peer)
        .timeout(inner.config.request_timeout())
        .build();

    let committed = inner.executor.execute(&handler, ctx).await;
    if inner.executor.is_exempt(&path) {
        raw_response(&committed)
    } else {
        envelope_response(&committed)
    }
}

/// Builds a JSON envelope response.
fn envelope_response(committed: &RawResponse) -> HttpResponse {
    Response::builder()
        .status(committed.status)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Full::new(committed.body.clone()))
        .unwrap_or_else(|_| Response::new(Full::new(committed.body.clone())))
}

/// Builds a response without assuming a content type; exempt-path
/// handlers own their own bytes.
fn raw_response(committed: &RawResponse) -> HttpResponse {
    Response::builder()
        .status(committed.status)
        .body(Full::new(committed.body.clone()))
        .unwrap_or_else(|_| Response::new(Full::new(committed.body.clone())))
}
