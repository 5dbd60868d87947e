//! Crate-level error types
//!
//! Recoverable failures (malformed records, dead connections) are handled
//! where they occur and never reach this type. `RelayError` covers the
//! failures that end the relay: transport bind/accept errors and fatal log
//! client errors, which surface to the process supervisor.

use crate::ingest::LogError;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, RelayError>;

/// Fatal relay error
#[derive(Debug)]
pub enum RelayError {
    /// Transport-level I/O error (bind, accept)
    Io(std::io::Error),
    /// Fatal error from the durable log client
    Log(LogError),
}

impl std::fmt::Display for RelayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelayError::Io(e) => write!(f, "transport I/O error: {}", e),
            RelayError::Log(e) => write!(f, "log client error: {}", e),
        }
    }
}

impl std::error::Error for RelayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RelayError::Io(e) => Some(e),
            RelayError::Log(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for RelayError {
    fn from(e: std::io::Error) -> Self {
        RelayError::Io(e)
    }
}

impl From<LogError> for RelayError {
    fn from(e: LogError) -> Self {
        RelayError::Log(e)
    }
}
