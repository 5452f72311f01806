//! Storage Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Network-related error (connection, timeout)
    #[display("network error: {_0}")]
    Network(#[error(not(source))] String),
    /// The backend received the request and rejected it
    #[display("backend error: {_0}")]
    BackendError(#[error(not(source))] String),
    /// Key contains invalid segments or escapes the store root
    #[display("invalid key: {_0}")]
    InvalidKey(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::BackendError(_))
    }
}
