//! Error types for address discovery
//!
//! Two layers of failure exist:
//! - [`ProbeFailure`]: why a single probe did not produce an address. These
//!   are absorbed by the race and never returned to callers.
//! - [`Error`]: what a caller can actually observe.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for ipseek operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type surfaced to callers
#[derive(Error, Debug)]
pub enum Error {
    /// Every launched probe failed (or none were launched)
    #[error("No address found: all {attempted} probe(s) failed")]
    NoAddressFound {
        /// Number of probes that were launched
        attempted: usize,
    },

    /// Invalid input, e.g. an unsupported address family selector
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local interface enumeration failed
    #[error("Interface error: {0}")]
    Interface(String),

    /// HTTP client construction errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// I/O errors (config files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a "no address found" error
    pub fn no_address_found(attempted: usize) -> Self {
        Self::NoAddressFound { attempted }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an interface enumeration error
    pub fn interface(msg: impl Into<String>) -> Self {
        Self::Interface(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Whether this is the expected "all sources unreachable" outcome
    pub fn is_no_address_found(&self) -> bool {
        matches!(self, Self::NoAddressFound { .. })
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

/// Reason a single probe failed
///
/// Probe failures are internal signals for the race's completion tracking.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    /// DNS, connect, TLS or body read error
    #[error("transport error: {0}")]
    Transport(String),

    /// Response status outside 2xx
    #[error("unexpected status {0}")]
    Status(u16),

    /// Response body was empty or whitespace only
    #[error("empty response body")]
    EmptyBody,

    /// Body had no recognizable address literal
    #[error("no address literal in response body")]
    NoAddressLiteral,

    /// No response within the probe timeout
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Probe task panicked or was cancelled
    #[error("probe task aborted: {0}")]
    Aborted(String),
}

impl ProbeFailure {
    /// Create a transport failure
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }
}
