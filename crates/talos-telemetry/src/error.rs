//! Telemetry error types.

use thiserror::Error;

/// Errors that can occur while setting up telemetry.
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Failed to initialize the logging subsystem.
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),
}
