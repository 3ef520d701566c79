//! Loan status classification.
//!
//! Overdue-ness is never persisted; it is always derived from the dates
//! on the loan and the evaluation date. This module is the single source
//! of truth the fine engine consumes.

use crate::models::Loan;
use time::Date;

/// Where a loan stands relative to its due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoanStatus {
    /// Open and not yet due.
    Active,
    /// Open and past its due date as of the evaluation date.
    Overdue,
    /// Returned on or before the due date.
    Returned,
    /// Returned after the due date.
    ReturnedLate,
}

impl LoanStatus {
    /// Whether a loan in this status owes a fine.
    pub fn is_finable(&self) -> bool {
        matches!(self, LoanStatus::Overdue | LoanStatus::ReturnedLate)
    }
}

/// Classify a loan as of the given date. Pure: same inputs, same answer.
///
/// A returned loan's status depends only on its own dates; `as_of` only
/// matters while the book is still out.
pub fn classify_status(loan: &Loan, as_of: Date) -> LoanStatus {
    match loan.date_in {
        Some(date_in) if date_in > loan.due_date => LoanStatus::ReturnedLate,
        Some(_) => LoanStatus::Returned,
        None if as_of > loan.due_date => LoanStatus::Overdue,
        None => LoanStatus::Active,
    }
}

/// Whole days past the due date, floored at zero.
///
/// `closing` is the return date for a closed loan, or the evaluation date
/// for one still out.
pub fn late_days(closing: Date, due_date: Date) -> u32 {
    u32::try_from((closing - due_date).whole_days()).unwrap_or(0)
}
