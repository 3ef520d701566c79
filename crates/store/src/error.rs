//! Store Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A store error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The underlying SQLite connection or query failed.
    #[display("database error")]
    Database,
    /// Schema migrations could not be applied.
    #[display("database migration error")]
    Migration,
    /// A uniqueness or referential constraint rejected the write.
    #[display("constraint violation")]
    Constraint,
    /// A persisted value could not be converted to its domain model.
    #[display("invalid stored data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Connection loss and lock contention are transient; a constraint
        // violation or corrupt row will fail the same way every time.
        matches!(self, ErrorKind::Database)
    }
}
