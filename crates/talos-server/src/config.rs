//! Server configuration.
//!
//! Built with the builder pattern; also convertible from the
//! `talos-config` file schema.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use talos_server::ServerConfig;
//!
//! let config = ServerConfig::builder()
//!     .addr("0.0.0.0:8080")
//!     .shutdown_grace(Duration::from_secs(30))
//!     .build();
//!
//! assert_eq!(config.addr(), "0.0.0.0:8080");
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use talos_config::ServerSection;

/// Default bind address.
pub const DEFAULT_ADDR: &str = "0.0.0.0:8080";

/// Default read timeout (bounds request body collection).
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Default write timeout.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default per-request deadline.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default graceful shutdown cutoff.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Default path exempt from the missing-envelope check.
pub const DEFAULT_EXEMPT_PATH: &str = "/metrics";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Service name, used in logs.
    service_name: String,

    /// Bind address (e.g. "0.0.0.0:8080").
    addr: String,

    /// Bounds request body collection.
    read_timeout: Duration,

    /// Write timeout, carried for the transport layer.
    write_timeout: Duration,

    /// Per-request deadline raced against the handler.
    request_timeout: Duration,

    /// Forced cutoff for connection draining on shutdown.
    shutdown_grace: Duration,

    /// Paths where a handler may write the transport response itself.
    exempt_paths: Vec<String>,
}

impl ServerConfig {
    /// Creates a configuration builder.
    #[must_use]
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Returns the service name.
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Returns the bind address string.
    #[must_use]
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Parses the bind address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be parsed.
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.addr.parse()
    }

    /// Returns the read timeout.
    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Returns the write timeout.
    #[must_use]
    pub fn write_timeout(&self) -> Duration {
        self.write_timeout
    }

    /// Returns the per-request deadline.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Returns the shutdown grace period.
    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        self.shutdown_grace
    }

    /// Returns the exempt paths.
    #[must_use]
    pub fn exempt_paths(&self) -> &[String] {
        &self.exempt_paths
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl From<&ServerSection> for ServerConfig {
    fn from(section: &ServerSection) -> Self {
        Self::builder()
            .service_name(&section.name)
            .addr(&section.address)
            .read_timeout(Duration::from_millis(section.read_timeout_ms))
            .write_timeout(Duration::from_millis(section.write_timeout_ms))
            .request_timeout(Duration::from_millis(section.request_timeout_ms))
            .shutdown_grace(Duration::from_millis(section.shutdown_grace_ms))
            .build()
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug, Clone)]
pub struct ServerConfigBuilder {
    service_name: String,
    addr: String,
    read_timeout: Duration,
    write_timeout: Duration,
    request_timeout: Duration,
    shutdown_grace: Duration,
    exempt_paths: Vec<String>,
}

impl ServerConfigBuilder {
    /// Creates a builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            service_name: "talos".to_string(),
            addr: DEFAULT_ADDR.to_string(),
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            exempt_paths: vec![DEFAULT_EXEMPT_PATH.to_string()],
        }
    }

    /// Sets the service name.
    #[must_use]
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    /// Sets the bind address.
    #[must_use]
    pub fn addr(mut self, addr: impl Into<String>) -> Self {
        self.addr = addr.into();
        self
    }

    /// Sets the read timeout.
    #[must_use]
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Sets the write timeout.
    #[must_use]
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Sets the per-request deadline.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the shutdown grace period.
    #[must_use]
    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Replaces the exempt paths.
    #[must_use]
    pub fn exempt_paths(mut self, paths: Vec<String>) -> Self {
        self.exempt_paths = paths;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> ServerConfig {
        ServerConfig {
            service_name: self.service_name,
            addr: self.addr,
            read_timeout: self.read_timeout,
            write_timeout: self.write_timeout,
            request_timeout: self.request_timeout,
            shutdown_grace: self.shutdown_grace,
            exempt_paths: self.exempt_paths,
        }
    }
}

impl Default for ServerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
