//! # Talos Config
//!
//! Configuration loading for Talos services.
//!
//! [`load_file`] reads any deserializable structure from a file,
//! dispatching on the extension: `.json`, `.toml`, and YAML for
//! everything else. [`ServiceConfig`] is the typed schema for the server
//! section, validated for presence only.
//!
//! ## Example
//!
//! ```rust,no_run
//! use talos_config::{load_file, ServiceConfig};
//!
//! # fn main() -> Result<(), talos_config::ConfigError> {
//! let config: ServiceConfig = load_file("config.yaml")?;
//! config.validate()?;
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/talos-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod loader;
mod schema;

pub use error::ConfigError;
pub use loader::load_file;
pub use schema::{ServerSection, ServiceConfig};
