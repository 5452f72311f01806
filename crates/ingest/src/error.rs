//! Ingestion Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};
use pkgindex_models::Id;
use std::fmt::{Display as FmtDisplay, Formatter, Result as FmtResult};

/// An ingestion error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for ingestion operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// ### Per-package Errors
/// Recorded against one package (which is marked `ingestionFailed`) without
/// affecting the rest of the batch:
/// - [`ErrorKind::InvalidUrl`]
/// - [`ErrorKind::FetchMetadataFailed`]
/// - [`ErrorKind::RepositorySaveFailed`]
/// - [`ErrorKind::RepositorySaveUniqueViolation`]
///
/// ### Run Errors
/// Make the whole run meaningless:
/// - [`ErrorKind::Database`] - candidates could not be selected.
/// - [`ErrorKind::Configuration`]
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("invalid package url: {_0}")]
    InvalidUrl(#[error(not(source))] String),
    #[display("fetchMetadataFailed({owner}, {name}, {details})")]
    FetchMetadataFailed {
        #[error(not(source))]
        owner: String,
        #[error(not(source))]
        name: String,
        #[error(not(source))]
        details: String,
    },
    #[display("repositorySaveFailed({owner}, {name}, {details})")]
    RepositorySaveFailed {
        #[error(not(source))]
        owner: String,
        #[error(not(source))]
        name: String,
        #[error(not(source))]
        details: String,
    },
    /// Another package already owns a repository with this owner and name.
    #[display("repositorySaveUniqueViolation({owner}, {name}, {details})")]
    RepositorySaveUniqueViolation {
        #[error(not(source))]
        owner: String,
        #[error(not(source))]
        name: String,
        #[error(not(source))]
        details: String,
    },
    /// Rendered readme or its images could not be written to the cache.
    #[display("readme cache error")]
    ReadmeCache,
    #[display("database error")]
    Database,
    #[display("configuration error")]
    Configuration,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::FetchMetadataFailed { .. } | Self::ReadmeCache | Self::Database => true,
            Self::InvalidUrl(_)
            | Self::RepositorySaveFailed { .. }
            | Self::RepositorySaveUniqueViolation { .. }
            | Self::Configuration => false,
        }
    }
}

/// Ingestion of one package failed.
#[derive(Debug)]
pub struct PackageFailure {
    pub package_id: Id,
    pub error: Error,
}
impl PackageFailure {
    pub fn kind(&self) -> &ErrorKind {
        &self.error
    }
}
impl FmtDisplay for PackageFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "Ingestion.Error({}, {})", self.package_id, self.kind())
    }
}
