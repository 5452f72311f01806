//! Database Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// A database error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for database operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("database error")]
    Database,
    #[display("database migration error")]
    Migration,
    /// A stored value could not be converted to or from its model.
    #[display("invalid stored data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
    /// A write collided with a uniqueness constraint; nothing was written.
    #[display("unique constraint violated: {details}")]
    UniqueViolation {
        #[error(not(source))]
        details: String,
    },
    #[display("not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// The requested status change is not allowed from the current state.
    #[display("invalid status transition: {_0}")]
    InvalidTransition(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // SQLITE_BUSY surfaces as a plain database error.
        matches!(self, Self::Database)
    }
}

/// Raise a sqlx error, distinguishing uniqueness violations from other
/// database failures.
pub(crate) fn raise_sqlx<T>(result: std::result::Result<T, sqlx::Error>) -> Result<T> {
    use exn::ResultExt;
    match result {
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            let details = e.message().to_string();
            Err(sqlx::Error::Database(e)).or_raise(|| ErrorKind::UniqueViolation { details })
        },
        other => other.or_raise(|| ErrorKind::Database),
    }
}
