//! # Talos
//!
//! **Graceful HTTP service foundation**
//!
//! Talos is the serving substrate for small JSON services:
//!
//! - a request executor that races every handler against its deadline
//!   and against a panic, committing exactly one outcome per request
//! - a graceful listener that drains in-flight connections on shutdown
//!   instead of severing them, bounded by a grace period
//! - a route table with hierarchical prefix grouping
//! - file-based configuration, structured logging, and a supervised
//!   primary/replica resource manager
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use talos::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_logging(&LogConfig::development())?;
//!
//!     let mut router = Router::new();
//!     router.get("/ping", |_: RequestContext| async { Some(JsonResponse::ok()) });
//!     router.group("/api/v1", |v1| {
//!         v1.get("/items", |_: RequestContext| async {
//!             Some(JsonResponse::ok().with_data(serde_json::json!([])))
//!         });
//!     });
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

#![doc(html_root_url = "https://docs.rs/talos/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use talos_core as core;

// Re-export the route table
pub use talos_router as router;

// Re-export the server lifecycle
pub use talos_server as server;

// Re-export configuration loading
pub use talos_config as config;

// Re-export logging initialization
pub use talos_telemetry as telemetry;

// Re-export the supervised resource manager
pub use talos_pool as pool;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use talos::prelude::*;
/// ```
pub mod prelude {
    pub use talos_core::{Handler, JsonResponse, RawResponse, RequestContext, RequestId};

    pub use talos_router::Router;

    pub use talos_server::{
        DrainOutcome, GracefulListener, Server, ServerConfig, ServerError, ShutdownSignal,
    };

    pub use talos_config::{load_file, ConfigError, ServiceConfig};

    pub use talos_telemetry::{init_logging, LogConfig};

    pub use talos_pool::{Connector, Managed, PoolConfig, PoolError, Replicated};
}
