//! Loan and fine models with their row conversions.
//!
//! The loan and fine lifecycles are owned entirely by the engines in this
//! crate; nothing else writes these tables. Rows carry the storage
//! encoding (epoch dates, raw cents) and convert fallibly into the domain
//! models, in both directions where needed.

use crate::error::{Error, ErrorKind, Result};
use crate::money::Cents;
use exn::ResultExt;
use stacks_store::epoch;
use time::Date;

/// A loan of one book to one borrower.
///
/// Exactly two states: open (`date_in` is `None`) and closed. Closing is
/// terminal; a re-borrow is a brand new loan with its own id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loan {
    pub loan_id: i64,
    pub isbn: String,
    pub card_id: String,
    pub date_out: Date,
    pub due_date: Date,
    pub date_in: Option<Date>,
}

impl Loan {
    /// Whether the book is still out.
    pub fn is_open(&self) -> bool {
        self.date_in.is_none()
    }
}

/// The fine attached to a loan (one-to-one, keyed by loan id).
///
/// While unpaid the amount is recomputed, not accumulated, on every
/// sweep. Once `paid` flips the row is frozen: it is the receipt of what
/// was owed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fine {
    pub loan_id: i64,
    pub amount: Cents,
    pub paid: bool,
}

#[derive(sqlx::FromRow)]
pub(crate) struct LoanRow {
    pub(crate) loan_id: i64,
    pub(crate) isbn: String,
    pub(crate) card_id: String,
    pub(crate) date_out: i64,
    pub(crate) due_date: i64,
    pub(crate) date_in: Option<i64>,
}
impl TryFrom<LoanRow> for Loan {
    type Error = Error;
    fn try_from(row: LoanRow) -> Result<Self> {
        Ok(Self {
            loan_id: row.loan_id,
            isbn: row.isbn,
            card_id: row.card_id,
            date_out: epoch::to_date(row.date_out).or_raise(|| ErrorKind::Store)?,
            due_date: epoch::to_date(row.due_date).or_raise(|| ErrorKind::Store)?,
            date_in: row.date_in.map(epoch::to_date).transpose().or_raise(|| ErrorKind::Store)?,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct FineRow {
    pub(crate) loan_id: i64,
    pub(crate) amount: i64,
    pub(crate) paid: bool,
}
impl TryFrom<FineRow> for Fine {
    type Error = Error;
    fn try_from(row: FineRow) -> Result<Self> {
        Ok(Self {
            loan_id: row.loan_id,
            amount: Cents::new(row.amount)?,
            paid: row.paid,
        })
    }
}
