//! Circulation Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use crate::money::Cents;
use derive_more::{Display, Error};
use time::Date;

/// A circulation error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for circulation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// Everything except [`ErrorKind::Store`] is a domain-state condition:
/// the request contradicts what the records say, and repeating it without
/// changing the records will fail identically. Retry policy for those
/// belongs to whoever changes the records, not to this crate.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The ISBN is not in the catalog.
    #[display("unknown book: {_0}")]
    BookNotFound(#[error(not(source))] String),
    /// The card id is not registered.
    #[display("unknown borrower: {_0}")]
    BorrowerNotFound(#[error(not(source))] String),
    /// No loan with this id exists.
    #[display("unknown loan: {_0}")]
    LoanNotFound(#[error(not(source))] i64),
    /// No fine is recorded for this loan.
    #[display("no fine recorded for loan {_0}")]
    FineNotFound(#[error(not(source))] i64),
    /// The ISBN already has an open loan; the single copy is out.
    #[display("book {_0} already has an open loan")]
    OpenLoanExists(#[error(not(source))] String),
    /// The loan was already closed; a closed loan is never edited.
    #[display("loan {_0} has already been returned")]
    AlreadyReturned(#[error(not(source))] i64),
    /// The fine was already settled; a paid fine is frozen.
    #[display("fine for loan {_0} has already been paid")]
    AlreadyPaid(#[error(not(source))] i64),
    /// A return cannot predate its checkout.
    #[display("return date {_0} precedes the checkout date")]
    ReturnBeforeCheckout(#[error(not(source))] Date),
    /// Partial payment is not supported; settlement is all-or-nothing.
    #[display("payment of {offered} does not cover the {owed} owed")]
    Underpayment { offered: Cents, owed: Cents },
    /// A monetary amount was negative.
    #[display("negative amount")]
    NegativeAmount,
    /// The underlying store failed; the whole transaction rolled back.
    #[display("storage error")]
    Store,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Every operation is a single transaction, so a store failure
        // leaves no partial state behind and the caller may safely
        // resubmit. A retried checkout re-observes open-loan state.
        matches!(self, ErrorKind::Store)
    }
}
