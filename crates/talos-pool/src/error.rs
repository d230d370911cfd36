//! Pool error types.

use thiserror::Error;

/// Boxed error returned by connector implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors produced by the resource manager.
#[derive(Error, Debug)]
pub enum PoolError {
    /// The backend refused or failed the connection attempt.
    #[error("failed to connect to backend")]
    Connect(#[source] BoxError),

    /// No healthy handle is currently available.
    #[error("no healthy handle available")]
    Unavailable,
}
