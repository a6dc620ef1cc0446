//! Error types for upstream platform calls.

use thiserror::Error;

/// Errors that can occur while talking to the upstream platform.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Network-level failure (DNS, connection refused, socket timeout).
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Upstream answered with a non-success status.
    #[error("Upstream returned {status}: {body}")]
    UpstreamHttp { status: u16, body: String },

    /// Upstream answered 2xx but the payload did not match the expected shape.
    #[error("Failed to decode upstream response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The call did not settle before its deadline.
    #[error("Deadline exceeded after {elapsed_ms}ms for {path}")]
    DeadlineExceeded { path: String, elapsed_ms: u128 },

    /// Identifier that cannot be used as a single path segment.
    #[error("Invalid resource identifier: '{0}'")]
    InvalidIdentifier(String),

    /// Invalid gateway configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl GatewayError {
    /// Whether this failure happened below HTTP (no status was received).
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::DeadlineExceeded { .. })
    }

    /// Upstream status code, if the upstream answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UpstreamHttp { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
