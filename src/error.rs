//! Error types for the IRC client.
//!
//! Codec-level problems (malformed lines, unknown escape sequences, odd
//! ISUPPORT values) never surface here: they are recovered where they are
//! found. What remains are the failures a caller can act on, which are
//! connection establishment and use of a connection in the wrong state.

use std::time::Duration;

use thiserror::Error;

/// Convenience type alias for Results using [`ClientError`].
pub type Result<T, E = ClientError> = std::result::Result<T, E>;

/// Top-level client errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// I/O error while opening the socket or during the TLS handshake.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The socket did not become writable within the connect timeout.
    #[error("connect to {addr} timed out after {timeout:?}")]
    ConnectTimeout {
        /// The `host:port` being connected to.
        addr: String,
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// The host name resolved to no usable address.
    #[error("could not resolve {0}")]
    Resolve(String),

    /// The TLS server name is not a valid DNS name or IP address.
    #[error("invalid TLS server name: {0}")]
    InvalidServerName(String),

    /// `connect` was called while a connection attempt is running or live.
    #[error("connection already established")]
    AlreadyConnected,

    /// The connection has been closed and cannot be reused.
    #[error("connection closed")]
    Closed,
}

impl ClientError {
    /// Whether this error is the distinguished connect-timeout condition.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::ConnectTimeout { .. })
    }
}
