//! Hosting Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// A hosting client error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for hosting client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// No API token is configured; nothing can be fetched.
    #[display("hosting API token not configured")]
    MissingToken,
    /// The API answered with a non-success status code.
    #[display("request failed with status {_0}")]
    RequestFailed(#[error(not(source))] u16),
    /// The repository (or the requested part of it) does not exist.
    #[display("not found")]
    NotFound,
    /// The API answered with a body that could not be understood.
    #[display("failed to decode response")]
    Decode,
    #[display("network error")]
    Network,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network => true,
            Self::RequestFailed(status) => *status == 429 || *status >= 500,
            Self::MissingToken | Self::NotFound | Self::Decode => false,
        }
    }
}
