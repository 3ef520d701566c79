//! Fine computation and settlement.
//!
//! Fines are derived state: while unpaid, the amount is recomputed from
//! the loan's dates on every pass, never accumulated. Payment freezes the
//! row for good. The actual state logic lives in [`apply_fine_state`] so
//! it can run inside whichever transaction needs it — its own during a
//! sweep, or the return transaction when a book comes back late.

use crate::error::{ErrorKind, Result};
use crate::models::{Fine, FineRow, Loan, LoanRow};
use crate::money::Cents;
use crate::policy::CirculationPolicy;
use crate::status::{LoanStatus, classify_status, late_days};
use exn::{OptionExt, ResultExt};
use sqlx::{SqliteConnection, SqlitePool};
use stacks_store::{Database, epoch};
use time::Date;
use tracing::instrument;

/// What a recomputation did to a loan's fine row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FineUpdate {
    /// The loan is compliant and no fine row exists; nothing to do.
    NotApplicable,
    /// An unpaid fine row was written with a freshly computed amount.
    Assessed(Fine),
    /// A stale unpaid fine row was deleted — the loan no longer meets the
    /// fine condition (e.g. its dates were corrected).
    Cleared,
    /// The fine has been paid; the row is frozen and was left untouched.
    Frozen(Fine),
}

impl FineUpdate {
    /// The fine row as it stands after the update, if one exists.
    pub fn into_fine(self) -> Option<Fine> {
        match self {
            FineUpdate::Assessed(fine) | FineUpdate::Frozen(fine) => Some(fine),
            FineUpdate::NotApplicable | FineUpdate::Cleared => None,
        }
    }
}

/// Bring a loan's fine row in line with its current status.
///
/// Runs against the caller's connection so return-and-recompute can be a
/// single transaction. Idempotent for a fixed `as_of`; monotone in
/// `as_of` for an open overdue loan, since late days only grow.
pub(crate) async fn apply_fine_state(
    conn: &mut SqliteConnection,
    loan: &Loan,
    as_of: Date,
    policy: &CirculationPolicy,
) -> Result<FineUpdate> {
    let existing: Option<FineRow> = sqlx::query_as(include_str!("../queries/get_fine.sql"))
        .bind(loan.loan_id)
        .fetch_optional(&mut *conn)
        .await
        .or_raise(|| ErrorKind::Store)?;
    let existing = existing.map(Fine::try_from).transpose()?;
    if let Some(fine) = existing
        && fine.paid
    {
        return Ok(FineUpdate::Frozen(fine));
    }
    let status = classify_status(loan, as_of);
    if !status.is_finable() {
        if existing.is_some() {
            sqlx::query(include_str!("../queries/delete_unpaid_fine.sql"))
                .bind(loan.loan_id)
                .execute(&mut *conn)
                .await
                .or_raise(|| ErrorKind::Store)?;
            return Ok(FineUpdate::Cleared);
        }
        return Ok(FineUpdate::NotApplicable);
    }
    // Once returned, lateness is fixed by the return date and stops
    // tracking the calendar.
    let closing = match status {
        LoanStatus::ReturnedLate => loan.date_in.unwrap_or(as_of),
        _ => as_of,
    };
    let amount = policy.fine_for(late_days(closing, loan.due_date));
    let row: FineRow = sqlx::query_as(include_str!("../queries/upsert_fine.sql"))
        .bind(loan.loan_id)
        .bind(amount.total_cents())
        .fetch_one(&mut *conn)
        .await
        .or_raise(|| ErrorKind::Store)?;
    Ok(FineUpdate::Assessed(Fine::try_from(row)?))
}

/// Owns the `fines` table: computes what late loans owe and settles
/// payments. Reads loans, never writes them.
#[derive(Debug, Clone)]
pub struct FineEngine {
    pool: SqlitePool,
    policy: CirculationPolicy,
}

impl FineEngine {
    pub fn new(db: &Database, policy: CirculationPolicy) -> Self {
        Self { pool: db.pool().clone(), policy }
    }

    /// The fine currently recorded for a loan.
    pub async fn fine(&self, loan_id: i64) -> Result<Fine> {
        let row: Option<FineRow> = sqlx::query_as(include_str!("../queries/get_fine.sql"))
            .bind(loan_id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Store)?;
        row.ok_or_raise(|| ErrorKind::FineNotFound(loan_id))?.try_into()
    }

    /// Recompute one loan's fine as of the given date.
    ///
    /// One transaction: load the loan, apply the fine state. Calling this
    /// repeatedly with the same `as_of` writes the same amount.
    #[instrument(skip(self))]
    pub async fn recompute(&self, loan_id: i64, as_of: Date) -> Result<FineUpdate> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Store)?;
        let row: Option<LoanRow> = sqlx::query_as(include_str!("../queries/get_loan.sql"))
            .bind(loan_id)
            .fetch_optional(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Store)?;
        let loan = Loan::try_from(row.ok_or_raise(|| ErrorKind::LoanNotFound(loan_id))?)?;
        let update = apply_fine_state(&mut tx, &loan, as_of, &self.policy).await?;
        tx.commit().await.or_raise(|| ErrorKind::Store)?;
        tracing::debug!(loan_id, ?update, "fine recomputed");
        Ok(update)
    }

    /// Refresh fines for every open loan past its due date.
    ///
    /// The batch counterpart of [`recompute`](Self::recompute), meant to
    /// run daily or on demand. Each loan gets its own transaction so the
    /// sweep never holds the writer lock across the whole pass and cannot
    /// interleave with a payment mid-update. Returns the number of fine
    /// rows actually written; frozen paid fines are skipped.
    #[instrument(skip(self))]
    pub async fn sweep_overdue(&self, as_of: Date) -> Result<u64> {
        let overdue: Vec<i64> = sqlx::query_scalar(include_str!("../queries/list_overdue_loans.sql"))
            .bind(epoch::from_date(as_of))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Store)?;
        let mut written = 0;
        for loan_id in overdue {
            if let FineUpdate::Assessed(_) = self.recompute(loan_id, as_of).await? {
                written += 1;
            }
        }
        tracing::info!(written, "overdue sweep complete");
        Ok(written)
    }

    /// Settle a fine in full.
    ///
    /// Partial payment is not supported — the schema's paid flag is
    /// binary — so `amount_paid` must cover the full amount. The amount
    /// stays at its final computed value as a receipt of what was owed.
    #[instrument(skip(self))]
    pub async fn pay_fine(&self, loan_id: i64, amount_paid: Cents) -> Result<Fine> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Store)?;
        let row: Option<FineRow> = sqlx::query_as(include_str!("../queries/get_fine.sql"))
            .bind(loan_id)
            .fetch_optional(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Store)?;
        let mut fine = Fine::try_from(row.ok_or_raise(|| ErrorKind::FineNotFound(loan_id))?)?;
        if fine.paid {
            exn::bail!(ErrorKind::AlreadyPaid(loan_id));
        }
        if amount_paid < fine.amount {
            exn::bail!(ErrorKind::Underpayment { offered: amount_paid, owed: fine.amount });
        }
        sqlx::query(include_str!("../queries/mark_fine_paid.sql"))
            .bind(loan_id)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Store)?;
        tx.commit().await.or_raise(|| ErrorKind::Store)?;
        fine.paid = true;
        tracing::info!(loan_id, amount = %fine.amount, "fine settled");
        Ok(fine)
    }
}
