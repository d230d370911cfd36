//! # Talos Server
//!
//! The concurrent request executor and graceful listener lifecycle:
//!
//! - [`Executor`] races each handler against its deadline and against
//!   abnormal termination, committing exactly one outcome per request
//! - [`GracefulListener`] drains active connections on shutdown instead
//!   of severing them, bounded by a grace period
//! - [`Server`] sequences startup, dispatch and the ordered shutdown
//!
//! ## Example
//!
//! ```rust,no_run
//! use talos_core::{JsonResponse, RequestContext};
//! use talos_router::Router;
//! use talos_server::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), talos_server::ServerError> {
//!     let mut router = Router::new();
//!     router.get("/ping", |_: RequestContext| async { Some(JsonResponse::ok()) });
//!
//!     let server = Server::builder()
//!         .config(ServerConfig::builder().addr("0.0.0.0:8080").build())
//!         .router(router)
//!         .build();
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/talos-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod executor;
pub mod listener;
pub mod server;
pub mod shutdown;

pub use config::{ServerConfig, ServerConfigBuilder};
pub use executor::Executor;
pub use listener::{DrainOutcome, GracefulListener, ListenerState};
pub use server::{BoundServer, HttpResponse, ResponseBody, Server, ServerBuilder, ServerError};
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};
