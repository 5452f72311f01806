//! Builder Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// A builder error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for builder operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A configuration value the operation needs is absent. Nothing was sent.
    #[display("missing configuration: {_0}")]
    MissingConfiguration(#[error(not(source))] &'static str),
    #[display("build farm API token not configured")]
    MissingToken,
    /// The build farm answered with a non-success status code.
    #[display("request failed with status {_0}: {_1}")]
    RequestFailed(#[error(not(source))] u16, #[error(not(source))] String),
    #[display("network error")]
    Network,
    #[display("failed to decode response")]
    Decode,
    /// No build with the reported id exists.
    #[display("build not found")]
    NotFound,
    /// The build already has a terminal status, or the reported one is not
    /// terminal.
    #[display("invalid build status transition")]
    InvalidTransition,
    #[display("database error")]
    Database,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network | Self::Database => true,
            Self::RequestFailed(status, _) => *status == 429 || *status >= 500,
            Self::MissingConfiguration(_)
            | Self::MissingToken
            | Self::Decode
            | Self::NotFound
            | Self::InvalidTransition => false,
        }
    }
}
