//! # Talos Pool
//!
//! Supervised resource management for backends with a connect/ping
//! lifecycle (databases, caches, upstream clients).
//!
//! A [`Managed`] resource owns the current handle and a background
//! monitor that pings it on an interval, reconnecting when the ping
//! fails. [`Replicated`] pairs a primary and a replica. Both are plain
//! owned values to be injected where needed — there is no process-global
//! state.
//!
//! ## Example
//!
//! ```rust,ignore
//! use talos_pool::{Connector, Managed, PoolConfig, Replicated};
//!
//! let pool = Replicated::new(&config, |dsn| MyDbConnector::new(dsn));
//! pool.connect().await?;
//! pool.start_monitors();
//!
//! let db = pool.primary().handle().await.ok_or(PoolError::Unavailable)?;
//! ```

#![doc(html_root_url = "https://docs.rs/talos-pool/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod manager;

pub use error::{BoxError, PoolError};
pub use manager::{Connector, Managed, PoolConfig, Replicated};
