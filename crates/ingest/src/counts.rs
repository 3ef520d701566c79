//! Post-load sanity check.
//!
//! After a bulk load, comparing the table counts against the load report
//! catches the quiet failure modes: an export with a stale header, a batch
//! that half-parsed, a load pointed at the wrong database file.

use crate::error::{ErrorKind, Result};
use crate::load::LoadReport;
use derive_more::Display;
use exn::ResultExt;
use stacks_store::{BorrowerRepository, CatalogRepository, Database};

/// A snapshot of row counts across the reference and circulation tables.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
#[display("books={books} authors={authors} book_authors={book_authors} borrowers={borrowers} loans={loans} fines={fines}")]
pub struct TableCounts {
    pub books: u64,
    pub authors: u64,
    pub book_authors: u64,
    pub borrowers: u64,
    pub loans: u64,
    pub fines: u64,
}

impl TableCounts {
    /// Count every table in one pass.
    pub async fn gather(db: &Database) -> Result<Self> {
        let catalog = CatalogRepository::from(db);
        let borrowers = BorrowerRepository::from(db);
        Ok(Self {
            books: catalog.count_books().await.or_raise(|| ErrorKind::Store)?,
            authors: catalog.count_authors().await.or_raise(|| ErrorKind::Store)?,
            book_authors: catalog.count_book_authors().await.or_raise(|| ErrorKind::Store)?,
            borrowers: borrowers.count_borrowers().await.or_raise(|| ErrorKind::Store)?,
            loans: count(db, "SELECT COUNT(*) FROM loans").await?,
            fines: count(db, "SELECT COUNT(*) FROM fines").await?,
        })
    }

    /// Whether a load into an empty database produced exactly these rows.
    pub fn accounts_for(&self, report: &LoadReport) -> bool {
        self.books == report.books as u64
            && self.authors == report.authors as u64
            && self.book_authors == report.links as u64
            && self.borrowers == report.borrowers as u64
    }
}

async fn count(db: &Database, query: &str) -> Result<u64> {
    let count: i64 = sqlx::query_scalar(query)
        .fetch_one(db.pool())
        .await
        .or_raise(|| ErrorKind::Store)?;
    Ok(count as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::Loader;

    #[tokio::test]
    async fn test_counts_match_a_fresh_load() {
        let db = Database::connect_in_memory().await.unwrap();
        let loader = Loader::from(&db);
        let books = "ISBN10\tTitle\tAuthor\n0000000001\tthe hobbit\tJ. R. R. Tolkien\n";
        let mut report = loader.load_books(books.as_bytes()).await.unwrap();
        let borrowers = "\
            ID0000id,first_name,last_name,address,city,state,phone,ssn\n\
            ID000001,jane,roe,1 Main St,Springfield,IL,5550100,123-45-6789\n";
        report.borrowers = loader.load_borrowers(borrowers.as_bytes()).await.unwrap().borrowers;

        let counts = TableCounts::gather(&db).await.unwrap();
        assert!(counts.accounts_for(&report));
        assert_eq!(counts.loans, 0);
        assert_eq!(counts.fines, 0);
        assert_eq!(
            counts.to_string(),
            "books=1 authors=1 book_authors=1 borrowers=1 loans=0 fines=0"
        );
    }

    #[tokio::test]
    async fn test_shortfall_is_detected() {
        let db = Database::connect_in_memory().await.unwrap();
        let loader = Loader::from(&db);
        let books = "ISBN10\tTitle\tAuthor\n0000000001\tthe hobbit\tJ. R. R. Tolkien\n";
        let report = loader.load_books(books.as_bytes()).await.unwrap();
        let inflated = LoadReport { books: report.books + 1, ..report };
        let counts = TableCounts::gather(&db).await.unwrap();
        assert!(!counts.accounts_for(&inflated));
    }
}
