//! Loan lifecycle: checkout and return.

use crate::error::{ErrorKind, Result};
use crate::fines::apply_fine_state;
use crate::models::{Loan, LoanRow};
use crate::policy::CirculationPolicy;
use exn::{OptionExt, ResultExt};
use sqlx::SqlitePool;
use stacks_store::{Database, epoch};
use time::Date;
use tracing::instrument;

/// Owns the `loans` table: creates loans at checkout and closes them at
/// return. Catalog and borrower records are consulted, never written.
#[derive(Debug, Clone)]
pub struct CirculationEngine {
    pool: SqlitePool,
    policy: CirculationPolicy,
}

impl CirculationEngine {
    pub fn new(db: &Database, policy: CirculationPolicy) -> Self {
        Self { pool: db.pool().clone(), policy }
    }

    pub fn policy(&self) -> &CirculationPolicy {
        &self.policy
    }

    /// Fetch a loan by id.
    pub async fn loan(&self, loan_id: i64) -> Result<Loan> {
        let row: Option<LoanRow> = sqlx::query_as(include_str!("../queries/get_loan.sql"))
            .bind(loan_id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Store)?;
        row.ok_or_raise(|| ErrorKind::LoanNotFound(loan_id))?.try_into()
    }

    /// Check a book out to a borrower.
    ///
    /// One transaction: verify the ISBN is cataloged and the card id is
    /// registered, then insert the open loan with
    /// `due_date = date_out + loan period`. The "at most one open loan
    /// per ISBN" rule is enforced by the store's partial unique index,
    /// not by a check here — when two checkouts race, the losing INSERT
    /// comes back as a unique violation and surfaces as
    /// [`ErrorKind::OpenLoanExists`].
    #[instrument(skip(self))]
    pub async fn checkout(&self, isbn: &str, card_id: &str, date_out: Date) -> Result<Loan> {
        let due_date = self.policy.due_date(date_out);
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Store)?;
        let book: i64 = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM books WHERE isbn = ?1)")
            .bind(isbn)
            .fetch_one(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Store)?;
        if book == 0 {
            exn::bail!(ErrorKind::BookNotFound(isbn.to_string()));
        }
        let borrower: i64 = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM borrowers WHERE card_id = ?1)")
            .bind(card_id)
            .fetch_one(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Store)?;
        if borrower == 0 {
            exn::bail!(ErrorKind::BorrowerNotFound(card_id.to_string()));
        }
        let inserted: std::result::Result<LoanRow, sqlx::Error> =
            sqlx::query_as(include_str!("../queries/insert_loan.sql"))
                .bind(isbn)
                .bind(card_id)
                .bind(epoch::from_date(date_out))
                .bind(epoch::from_date(due_date))
                .fetch_one(&mut *tx)
                .await;
        let row = match inserted {
            Ok(row) => row,
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                exn::bail!(ErrorKind::OpenLoanExists(isbn.to_string()))
            },
            Err(e) => return Err(e).or_raise(|| ErrorKind::Store),
        };
        tx.commit().await.or_raise(|| ErrorKind::Store)?;
        let loan = Loan::try_from(row)?;
        tracing::info!(loan_id = loan.loan_id, isbn, card_id, %due_date, "book checked out");
        Ok(loan)
    }

    /// Close a loan.
    ///
    /// Setting `date_in` is terminal: the UPDATE is guarded by
    /// `date_in IS NULL`, so a closed loan can never be edited and a
    /// second return fails with [`ErrorKind::AlreadyReturned`]. The fine
    /// recomputation runs inside the same transaction, so a late return
    /// produces its fine — and an on-time return clears any stale one —
    /// before the close is visible to anyone.
    #[instrument(skip(self))]
    pub async fn return_book(&self, loan_id: i64, date_in: Date) -> Result<Loan> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Store)?;
        let row: Option<LoanRow> = sqlx::query_as(include_str!("../queries/get_loan.sql"))
            .bind(loan_id)
            .fetch_optional(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Store)?;
        let mut loan = Loan::try_from(row.ok_or_raise(|| ErrorKind::LoanNotFound(loan_id))?)?;
        if loan.date_in.is_some() {
            exn::bail!(ErrorKind::AlreadyReturned(loan_id));
        }
        if date_in < loan.date_out {
            exn::bail!(ErrorKind::ReturnBeforeCheckout(date_in));
        }
        let updated = sqlx::query(include_str!("../queries/close_loan.sql"))
            .bind(epoch::from_date(date_in))
            .bind(loan_id)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Store)?;
        if updated.rows_affected() == 0 {
            exn::bail!(ErrorKind::AlreadyReturned(loan_id));
        }
        loan.date_in = Some(date_in);
        apply_fine_state(&mut tx, &loan, date_in, &self.policy).await?;
        tx.commit().await.or_raise(|| ErrorKind::Store)?;
        tracing::info!(loan_id, %date_in, "book returned");
        Ok(loan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fines::{FineEngine, FineUpdate};
    use crate::money::Cents;
    use crate::status::{LoanStatus, classify_status};
    use stacks_store::{Book, Borrower, CatalogRepository};
    use time::macros::date;

    async fn fixtures() -> (Database, CirculationEngine, FineEngine) {
        let db = Database::connect_in_memory().await.unwrap();
        let catalog = CatalogRepository::from(&db);
        catalog.upsert_book(&Book::new("0000000002", "Animal Farm").unwrap()).await.unwrap();
        catalog.upsert_book(&Book::new("0000000003", "Homage to Catalonia").unwrap()).await.unwrap();
        let borrowers = stacks_store::BorrowerRepository::from(&db);
        borrowers
            .upsert_borrower(&Borrower::new("ID00002", "123456789", "Jane Roe", "1 Main St", None).unwrap())
            .await
            .unwrap();
        borrowers
            .upsert_borrower(&Borrower::new("ID00003", "987654321", "John Doe", "2 Main St", None).unwrap())
            .await
            .unwrap();
        let policy = CirculationPolicy::default();
        let engine = CirculationEngine::new(&db, policy);
        let fines = FineEngine::new(&db, policy);
        (db, engine, fines)
    }

    async fn count_loans(db: &Database) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM loans").fetch_one(db.pool()).await.unwrap()
    }

    #[tokio::test]
    async fn test_checkout_computes_due_date() {
        let (_db, engine, _fines) = fixtures().await;
        let loan = engine.checkout("0000000002", "ID00002", date!(2025 - 01 - 01)).await.unwrap();
        assert_eq!(loan.due_date, date!(2025 - 01 - 15));
        assert!(loan.is_open());
        let fetched = engine.loan(loan.loan_id).await.unwrap();
        assert_eq!(fetched, loan);
    }

    #[tokio::test]
    async fn test_checkout_unknown_book_or_borrower() {
        let (db, engine, _fines) = fixtures().await;
        assert!(engine.checkout("9999999999", "ID00002", date!(2025 - 01 - 01)).await.is_err());
        assert!(engine.checkout("0000000002", "ID00099", date!(2025 - 01 - 01)).await.is_err());
        assert_eq!(count_loans(&db).await, 0);
    }

    #[tokio::test]
    async fn test_checkout_conflicts_while_loan_open() {
        let (db, engine, _fines) = fixtures().await;
        engine.checkout("0000000002", "ID00002", date!(2025 - 01 - 01)).await.unwrap();
        // Even a different borrower can't take the single copy.
        let conflict = engine.checkout("0000000002", "ID00003", date!(2025 - 01 - 02)).await;
        assert!(conflict.is_err());
        assert_eq!(count_loans(&db).await, 1);
    }

    #[tokio::test]
    async fn test_borrower_may_hold_multiple_loans() {
        let (db, engine, _fines) = fixtures().await;
        engine.checkout("0000000002", "ID00002", date!(2025 - 01 - 01)).await.unwrap();
        engine.checkout("0000000003", "ID00002", date!(2025 - 01 - 01)).await.unwrap();
        assert_eq!(count_loans(&db).await, 2);
    }

    #[tokio::test]
    async fn test_return_closes_loan_once() {
        let (_db, engine, _fines) = fixtures().await;
        let loan = engine.checkout("0000000002", "ID00002", date!(2025 - 01 - 01)).await.unwrap();
        let returned = engine.return_book(loan.loan_id, date!(2025 - 01 - 10)).await.unwrap();
        assert_eq!(returned.date_in, Some(date!(2025 - 01 - 10)));
        // A closed loan is terminal; the date can never be rewritten.
        assert!(engine.return_book(loan.loan_id, date!(2025 - 01 - 11)).await.is_err());
        assert_eq!(engine.loan(loan.loan_id).await.unwrap().date_in, Some(date!(2025 - 01 - 10)));
    }

    #[tokio::test]
    async fn test_return_before_checkout_rejected() {
        let (_db, engine, _fines) = fixtures().await;
        let loan = engine.checkout("0000000002", "ID00002", date!(2025 - 01 - 05)).await.unwrap();
        assert!(engine.return_book(loan.loan_id, date!(2025 - 01 - 04)).await.is_err());
        assert!(engine.loan(loan.loan_id).await.unwrap().is_open());
    }

    #[tokio::test]
    async fn test_return_unknown_loan() {
        let (_db, engine, _fines) = fixtures().await;
        assert!(engine.return_book(42, date!(2025 - 01 - 10)).await.is_err());
    }

    #[tokio::test]
    async fn test_reborrow_after_return_creates_new_loan() {
        let (db, engine, _fines) = fixtures().await;
        let first = engine.checkout("0000000002", "ID00002", date!(2025 - 01 - 01)).await.unwrap();
        engine.return_book(first.loan_id, date!(2025 - 01 - 10)).await.unwrap();
        let second = engine.checkout("0000000002", "ID00003", date!(2025 - 02 - 01)).await.unwrap();
        assert_ne!(first.loan_id, second.loan_id);
        assert_eq!(count_loans(&db).await, 2);
    }

    // The sample-data scenario: loan 2 out 2025-01-01, due 2025-01-15,
    // returned ten days late on 2025-01-25 at $0.25/day.
    #[tokio::test]
    async fn test_late_return_produces_fine() {
        let (_db, engine, fines) = fixtures().await;
        let loan = engine.checkout("0000000002", "ID00002", date!(2025 - 01 - 01)).await.unwrap();
        let returned = engine.return_book(loan.loan_id, date!(2025 - 01 - 25)).await.unwrap();
        assert_eq!(classify_status(&returned, date!(2025 - 01 - 25)), LoanStatus::ReturnedLate);
        let fine = fines.fine(loan.loan_id).await.unwrap();
        assert_eq!(fine.amount, Cents::of(250));
        assert_eq!(fine.amount.to_string(), "$2.50");
        assert!(!fine.paid);
    }

    #[tokio::test]
    async fn test_late_fine_is_fixed_by_return_date() {
        let (_db, engine, fines) = fixtures().await;
        let loan = engine.checkout("0000000002", "ID00002", date!(2025 - 01 - 01)).await.unwrap();
        engine.return_book(loan.loan_id, date!(2025 - 01 - 25)).await.unwrap();
        // Months later the fine still reflects the ten late days.
        fines.recompute(loan.loan_id, date!(2025 - 06 - 01)).await.unwrap();
        assert_eq!(fines.fine(loan.loan_id).await.unwrap().amount, Cents::of(250));
    }

    #[tokio::test]
    async fn test_on_time_return_clears_stale_fine() {
        let (_db, engine, fines) = fixtures().await;
        let loan = engine.checkout("0000000002", "ID00002", date!(2025 - 01 - 01)).await.unwrap();
        // A sweep while the book is out past due assesses a fine...
        let update = fines.recompute(loan.loan_id, date!(2025 - 01 - 20)).await.unwrap();
        assert!(matches!(update, FineUpdate::Assessed(_)));
        // ...but the return comes in backdated to an on-time date (say a
        // drop-box return processed late), so the fine condition no
        // longer holds and the row is cleared in the same transaction.
        engine.return_book(loan.loan_id, date!(2025 - 01 - 14)).await.unwrap();
        assert!(fines.fine(loan.loan_id).await.is_err());
    }
}
