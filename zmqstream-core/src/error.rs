//! zmqstream Error Types
//!
//! Every error is raised synchronously by the call that caused it. Flow
//! control (a full transport, an empty inbox) is never reported here.

use crate::options::SocketOption;
use std::io;
use thiserror::Error;

/// Main error type for stream socket operations
#[derive(Error, Debug)]
pub enum StreamError {
    /// Operation attempted after `close()`
    #[error("Socket is closed")]
    Closed,

    /// Missing or empty endpoint passed to bind/connect/unbind/disconnect
    #[error("{0}")]
    Endpoint(String),

    /// Fault reported by the underlying transport
    #[error("Transport error: {0}")]
    Transport(#[from] io::Error),

    /// Option value of the wrong type, or a read-only option
    #[error("Invalid value for option {option}: {reason}")]
    InvalidOption {
        option: SocketOption,
        reason: String,
    },
}

/// Result type alias for stream socket operations
pub type Result<T> = std::result::Result<T, StreamError>;

impl StreamError {
    /// The error raised when no endpoint was supplied.
    #[must_use]
    pub fn no_endpoint() -> Self {
        Self::Endpoint("No endpoint".to_string())
    }

    /// Create an invalid option error
    pub fn invalid_option(option: SocketOption, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            option,
            reason: reason.into(),
        }
    }

    /// Check if this error comes from a closed socket
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Check if retrying the same call later may succeed
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Transport(e) => matches!(
                e.kind(),
                io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
            ),
            Self::Closed | Self::Endpoint(_) | Self::InvalidOption { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_endpoint_message() {
        let err = StreamError::no_endpoint();
        assert_eq!(err.to_string(), "No endpoint");
        assert!(matches!(err, StreamError::Endpoint(_)));
    }

    #[test]
    fn test_transport_from_io() {
        let err: StreamError = io::Error::new(io::ErrorKind::Interrupted, "signal").into();
        assert!(err.is_recoverable());
        assert!(!err.is_closed());

        let err: StreamError = io::Error::new(io::ErrorKind::BrokenPipe, "gone").into();
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_closed_not_recoverable() {
        assert!(StreamError::Closed.is_closed());
        assert!(!StreamError::Closed.is_recoverable());
    }
}
