//! # Talos Telemetry
//!
//! Structured logging for Talos services, built on the tracing stack.
//!
//! ## Example
//!
//! ```rust,ignore
//! use talos_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::production())?;
//!
//! tracing::info!(http.path = "/items", latency_ms = 12.4, "request completed");
//! ```

#![doc(html_root_url = "https://docs.rs/talos-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};

/// Result alias for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
