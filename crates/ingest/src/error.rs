//! Ingest Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// An ingest error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for ingest operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The delimited input could not be read or parsed.
    #[display("could not read {_0} records")]
    Csv(#[error(not(source))] &'static str),
    /// A record parsed but fails entity validation.
    #[display("invalid {table} record: {detail}")]
    InvalidRecord {
        /// Which table the record was destined for.
        table: &'static str,
        /// The offending key or value.
        detail: String,
    },
    /// The input file could not be opened.
    #[display("could not open input file")]
    Io,
    /// Writing to the store failed; the file's transaction rolled back.
    #[display("storage error")]
    Store,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Loads are upserts, so the whole run can be resubmitted after a
        // transient store failure. Bad input stays bad.
        matches!(self, ErrorKind::Store)
    }
}
