//! Borrower repository.
//!
//! Borrower records are created by registration tooling outside this core
//! and read here for existence checks. Card id and SSN are identity keys:
//! an upsert may refresh name/address/phone but never rewrites either key.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::Borrower;
use exn::ResultExt;
use sqlx::SqlitePool;

/// Repository for the `borrowers` table.
#[derive(Debug, Clone)]
pub struct BorrowerRepository {
    pool: SqlitePool,
}
impl From<&Database> for BorrowerRepository {
    fn from(db: &Database) -> Self {
        Self::new(db.pool().clone())
    }
}
impl BorrowerRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Whether a card id is registered.
    pub async fn borrower_exists(&self, card_id: impl AsRef<str>) -> Result<bool> {
        let exists: i64 = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM borrowers WHERE card_id = ?1)")
            .bind(card_id.as_ref())
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(exists != 0)
    }

    /// Fetch a single borrower record.
    pub async fn get_borrower(&self, card_id: impl AsRef<str>) -> Result<Option<Borrower>> {
        sqlx::query_as(include_str!("../queries/get_borrower.sql"))
            .bind(card_id.as_ref())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    /// Insert a borrower, or refresh the mutable fields of an existing one.
    ///
    /// An SSN clash with a *different* card id is a hard
    /// [`ErrorKind::Constraint`]: two borrowers cannot share an SSN and the
    /// key is immutable.
    pub async fn upsert_borrower(&self, borrower: &Borrower) -> Result<()> {
        let result = sqlx::query(include_str!("../queries/upsert_borrower.sql"))
            .bind(&borrower.card_id)
            .bind(&borrower.ssn)
            .bind(&borrower.name)
            .bind(&borrower.address)
            .bind(&borrower.phone)
            .execute(&self.pool)
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                exn::bail!(ErrorKind::Constraint)
            },
            Err(e) => Err(e).or_raise(|| ErrorKind::Database),
        }
    }

    /// Insert or refresh a batch of borrowers in one transaction.
    pub async fn upsert_borrowers(&self, borrowers: &[Borrower]) -> Result<()> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        for borrower in borrowers {
            let result = sqlx::query(include_str!("../queries/upsert_borrower.sql"))
                .bind(&borrower.card_id)
                .bind(&borrower.ssn)
                .bind(&borrower.name)
                .bind(&borrower.address)
                .bind(&borrower.phone)
                .execute(&mut *tx)
                .await;
            match result {
                Ok(_) => {},
                Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                    exn::bail!(ErrorKind::Constraint)
                },
                Err(e) => return Err(e).or_raise(|| ErrorKind::Database),
            }
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    /// Count registered borrowers.
    pub async fn count_borrowers(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM borrowers")
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(count as u64)
    }
}
