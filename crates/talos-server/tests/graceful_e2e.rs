//! End-to-end server tests over a real socket.
//!
//! These tests exercise the full path: TCP accept, hyper http1 parsing,
//! route lookup, the executor race, and the ordered shutdown — using a
//! raw TCP client so the wire behavior (including severed connections)
//! is observable.

use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use http::StatusCode;
use serde_json::Value;
use talos_core::{JsonResponse, RequestContext};
use talos_router::Router;
use talos_server::{
    DrainOutcome, Server, ServerConfig, ServerError, ShutdownSignal,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

type ServeHandle = JoinHandle<Result<DrainOutcome, ServerError>>;

fn test_router() -> Router {
    let mut router = Router::new();
    router.get("/ping", |_: RequestContext| async {
        Some(JsonResponse::ok().with_message("pong"))
    });
    router.get("/slow", |_: RequestContext| async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Some(JsonResponse::ok())
    });
    router.get("/wait", |_: RequestContext| async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        Some(JsonResponse::ok().with_message("waited"))
    });
    router.get("/boom", |_: RequestContext| async { panic!("boom") });
    router.get("/metrics", |ctx: RequestContext| async move {
        ctx.write_raw(StatusCode::OK, Bytes::from_static(b"# HELP requests_total"));
        None
    });
    router
}

async fn start(config: ServerConfig) -> (SocketAddr, ShutdownSignal, ServeHandle) {
    let bound = Server::builder()
        .config(config)
        .router(test_router())
        .build()
        .bind()
        .await
        .unwrap();

    let addr = bound.local_addr();
    let shutdown = ShutdownSignal::new();
    let handle = tokio::spawn(bound.serve(shutdown.clone()));
    (addr, shutdown, handle)
}

fn short_timeouts() -> ServerConfig {
    ServerConfig::builder()
        .addr("127.0.0.1:0")
        .request_timeout(Duration::from_millis(100))
        .shutdown_grace(Duration::from_secs(2))
        .build()
}

/// One HTTP/1.1 request over a fresh connection, read to close.
async fn http_get(addr: SocketAddr, path: &str) -> (u16, String) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let text = String::from_utf8_lossy(&raw).to_string();

    let status = text
        .split_whitespace()
        .nth(1)
        .expect("status line")
        .parse()
        .expect("numeric status");
    let body = text.split("\r\n\r\n").nth(1).unwrap_or("").to_string();
    (status, body)
}

#[tokio::test]
async fn test_request_round_trip() {
    let (addr, shutdown, handle) = start(short_timeouts()).await;

    let (status, body) = http_get(addr, "/ping").await;
    assert_eq!(status, 200);

    let envelope: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(envelope["message"], "pong");
    assert!(envelope["latency"].as_f64().is_some());

    shutdown.trigger();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_route_miss_returns_404_envelope() {
    let (addr, shutdown, handle) = start(short_timeouts()).await;

    let (status, body) = http_get(addr, "/nope").await;
    assert_eq!(status, 404);

    let envelope: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(envelope["message"], "Not Found");

    shutdown.trigger();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_deadline_yields_408() {
    let (addr, shutdown, handle) = start(short_timeouts()).await;

    let (status, body) = http_get(addr, "/slow").await;
    assert_eq!(status, 408);

    let envelope: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(envelope["message"], "Request Timeout");
    assert!(envelope["latency"].as_f64().unwrap() >= 100.0);

    shutdown.trigger();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_panic_yields_500() {
    let (addr, shutdown, handle) = start(short_timeouts()).await;

    let (status, body) = http_get(addr, "/boom").await;
    assert_eq!(status, 500);

    let envelope: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(envelope["message"], "Internal Server Error");

    shutdown.trigger();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_exempt_path_serves_raw_bytes() {
    let (addr, shutdown, handle) = start(short_timeouts()).await;

    let (status, body) = http_get(addr, "/metrics").await;
    assert_eq!(status, 200);
    assert_eq!(body, "# HELP requests_total");

    shutdown.trigger();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_drain_completes_in_flight_request() {
    let config = ServerConfig::builder()
        .addr("127.0.0.1:0")
        .request_timeout(Duration::from_secs(5))
        .shutdown_grace(Duration::from_secs(2))
        .build();
    let (addr, shutdown, handle) = start(config).await;

    let in_flight = tokio::spawn(async move { http_get(addr, "/wait").await });

    // Let the request reach the handler before draining starts.
    tokio::time::sleep(Duration::from_millis(30)).await;
    shutdown.trigger();

    let (status, body) = in_flight.await.unwrap();
    assert_eq!(status, 200);
    let envelope: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(envelope["message"], "waited");

    let outcome = handle.await.unwrap().unwrap();
    assert_eq!(outcome, DrainOutcome::Drained);
}

#[tokio::test]
async fn test_grace_cutoff_reports_severed_connections() {
    let config = ServerConfig::builder()
        .addr("127.0.0.1:0")
        .request_timeout(Duration::from_secs(30))
        .shutdown_grace(Duration::from_millis(50))
        .build();
    let (addr, shutdown, handle) = start(config).await;

    // A request that outlives the grace period.
    let hung = tokio::spawn(async move { http_get(addr, "/slow").await });
    tokio::time::sleep(Duration::from_millis(30)).await;

    shutdown.trigger();
    let outcome = handle.await.unwrap().unwrap();
    assert_eq!(outcome, DrainOutcome::GraceExpired { active: 1 });

    hung.abort();
}

#[tokio::test]
async fn test_connect_refused_after_shutdown() {
    let (addr, shutdown, handle) = start(short_timeouts()).await;

    shutdown.trigger();
    handle.await.unwrap().unwrap();

    // The socket is closed; nothing is listening on the address.
    assert!(TcpStream::connect(addr).await.is_err());
}
