//! Typed service configuration schema.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Default read timeout in milliseconds.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 10_000;

/// Default write timeout in milliseconds.
pub const DEFAULT_WRITE_TIMEOUT_MS: u64 = 10_000;

/// Default per-request timeout in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Default shutdown grace period in milliseconds.
pub const DEFAULT_SHUTDOWN_GRACE_MS: u64 = 30_000;

/// Top-level service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Server/listener settings.
    pub server: ServerSection,
}

impl ServiceConfig {
    /// Validates that required values are present.
    ///
    /// Timeouts beyond presence are opaque to this crate; the server
    /// interprets them.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()
    }
}

/// Server/listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    /// Service name, used in logs and the Server header.
    pub name: String,

    /// Bind address (e.g. "0.0.0.0:8080").
    pub address: String,

    /// Read timeout in milliseconds (bounds request body collection).
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Write timeout in milliseconds.
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,

    /// Per-request deadline in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Graceful shutdown cutoff in milliseconds.
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

impl ServerSection {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::missing_field("server.name"));
        }
        if self.address.trim().is_empty() {
            return Err(ConfigError::missing_field("server.address"));
        }
        if self.shutdown_grace_ms == 0 {
            return Err(ConfigError::invalid_value(
                "server.shutdown_grace_ms",
                "grace period must be nonzero",
            ));
        }
        Ok(())
    }
}

fn default_read_timeout_ms() -> u64 {
    DEFAULT_READ_TIMEOUT_MS
}

fn default_write_timeout_ms() -> u64 {
    DEFAULT_WRITE_TIMEOUT_MS
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

fn default_shutdown_grace_ms() -> u64 {
    DEFAULT_SHUTDOWN_GRACE_MS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_section() -> ServerSection {
        ServerSection {
            name: "svc".to_string(),
            address: "127.0.0.1:8080".to_string(),
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            write_timeout_ms: DEFAULT_WRITE_TIMEOUT_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            shutdown_grace_ms: DEFAULT_SHUTDOWN_GRACE_MS,
        }
    }

    #[test]
    fn test_valid_config() {
        let config = ServiceConfig {
            server: valid_section(),
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_name_rejected() {
        let config = ServiceConfig {
            server: ServerSection {
                name: "  ".to_string(),
                ..valid_section()
            },
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField { field }) if field == "server.name"
        ));
    }

    #[test]
    fn test_missing_address_rejected() {
        let config = ServiceConfig {
            server: ServerSection {
                address: String::new(),
                ..valid_section()
            },
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_grace_rejected() {
        let config = ServiceConfig {
            server: ServerSection {
                shutdown_grace_ms: 0,
                ..valid_section()
            },
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_timeout_defaults_applied() {
        let yaml = "server:\n  name: svc\n  address: 0.0.0.0:8080\n";
        let config: ServiceConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.server.request_timeout_ms, DEFAULT_REQUEST_TIMEOUT_MS);
        assert_eq!(config.server.shutdown_grace_ms, DEFAULT_SHUTDOWN_GRACE_MS);
        assert!(config.validate().is_ok());
    }
}
