//! Error types for sigma-query.
//!
//! Every stage of query execution fails with a [`SigmaError`]. The variant tells
//! the caller whether re-running the whole query is worthwhile.

use thiserror::Error;

/// Main error type for sigma-query operations.
#[derive(Error, Debug)]
pub enum SigmaError {
    /// Connection, DNS, TLS or timeout failure before a response arrived.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The remote service answered with a non-success HTTP status.
    #[error("Remote error ({status}): {body}")]
    Remote { status: u16, body: String },

    /// A response did not have the expected shape.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The query run failed on the server side.
    #[error("Query failed: {detail}")]
    QueryFailed { detail: String },

    /// The run was still not terminal after the whole poll budget.
    #[error("Query did not complete within {attempts} attempts")]
    Timeout { attempts: u32 },

    /// The caller cancelled the query before it finished.
    #[error("Query execution was cancelled")]
    Cancelled,

    /// Configuration errors (invalid config file, missing API key, etc.)
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SigmaError {
    /// Creates a transport error with the given message.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Creates a remote error from an HTTP status and response body.
    pub fn remote(status: u16, body: impl Into<String>) -> Self {
        Self::Remote {
            status,
            body: body.into(),
        }
    }

    /// Creates a protocol error with the given message.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Creates a query failure carrying the server's error detail verbatim.
    pub fn query_failed(detail: impl Into<String>) -> Self {
        Self::QueryFailed {
            detail: detail.into(),
        }
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Transport(_) => "Transport Error",
            Self::Remote { .. } => "Remote Error",
            Self::Protocol(_) => "Protocol Error",
            Self::QueryFailed { .. } => "Query Error",
            Self::Timeout { .. } => "Timeout Error",
            Self::Cancelled => "Cancelled",
            Self::Config(_) => "Configuration Error",
        }
    }

    /// Returns true if re-running the whole query could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout { .. } => true,
            Self::Remote { status, .. } => *status == 429 || *status >= 500,
            Self::Protocol(_) | Self::QueryFailed { .. } | Self::Cancelled | Self::Config(_) => {
                false
            }
        }
    }
}

impl From<reqwest::Error> for SigmaError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::transport(format!("Request timed out: {}", e))
        } else if e.is_connect() {
            Self::transport(format!("Failed to connect: {}", e))
        } else {
            Self::transport(format!("Request failed: {}", e))
        }
    }
}

/// Result type alias using SigmaError.
pub type Result<T> = std::result::Result<T, SigmaError>;
