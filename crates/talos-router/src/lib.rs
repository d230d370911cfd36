//! # Talos Router
//!
//! Route table mapping `(method, path)` pairs to handlers, with
//! hierarchical prefix grouping.
//!
//! Matching is exact: paths are compared as registered, with no wildcard
//! or parameter syntax. The table is built at startup and read-only
//! while serving, so lookups need no synchronization.
//!
//! ## Example
//!
//! ```rust
//! use http::Method;
//! use talos_core::{JsonResponse, RequestContext};
//! use talos_router::Router;
//!
//! let mut router = Router::new();
//! router.get("/ping", |_ctx: RequestContext| async { Some(JsonResponse::ok()) });
//!
//! router.group("/api/v1", |api| {
//!     api.get("/items", |_ctx: RequestContext| async { Some(JsonResponse::ok()) });
//! });
//!
//! assert!(router.lookup(&Method::GET, "/api/v1/items").is_some());
//! ```

#![doc(html_root_url = "https://docs.rs/talos-router/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod router;

pub use router::{Router, RouteEntry};
