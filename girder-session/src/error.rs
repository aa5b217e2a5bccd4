//! Error types for session operations.

use thiserror::Error;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Session-specific errors.
///
/// Request-time problems with incoming cookies are never errors; a bad
/// cookie simply yields an empty session.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// A key contains a character reserved by the cookie codec.
    #[error("Invalid session key {0:?}: keys must not contain ':' or NUL")]
    InvalidKey(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Encryption could not be performed
    #[error("Crypto error: {0}")]
    Crypto(String),
}
