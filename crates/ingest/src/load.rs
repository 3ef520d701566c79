//! Bulk load into the store.
//!
//! The loader reads raw exports, normalizes them, and writes each table as
//! one batched transaction through the store repositories. Loads are
//! upserts keyed on the natural identifiers, so re-running a load with a
//! corrected export refreshes records instead of duplicating them.

use crate::borrowers::read_raw_borrowers;
use crate::catalog::{CatalogBatch, read_raw_books};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use stacks_store::{Borrower, BorrowerRepository, CatalogRepository, Database};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use tracing::{info, instrument, warn};

/// Row counts written by one load run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub books: usize,
    pub authors: usize,
    pub links: usize,
    pub borrowers: usize,
}

/// Reads raw exports and writes them through the store repositories.
#[derive(Debug, Clone)]
pub struct Loader {
    catalog: CatalogRepository,
    borrowers: BorrowerRepository,
}

impl From<&Database> for Loader {
    fn from(db: &Database) -> Self {
        Self { catalog: db.into(), borrowers: db.into() }
    }
}

impl Loader {
    /// Normalize and load a raw book export.
    #[instrument(skip_all)]
    pub async fn load_books(&self, reader: impl Read) -> Result<LoadReport> {
        let CatalogBatch { books, authors, links } = read_raw_books(reader)?;
        self.catalog.upsert_books(&books).await.or_raise(|| ErrorKind::Store)?;
        self.catalog.upsert_authors(&authors).await.or_raise(|| ErrorKind::Store)?;
        self.catalog.link_book_authors(&links).await.or_raise(|| ErrorKind::Store)?;
        let report = LoadReport {
            books: books.len(),
            authors: authors.len(),
            links: links.len(),
            ..LoadReport::default()
        };
        info!(books = report.books, authors = report.authors, links = report.links, "catalog loaded");
        Ok(report)
    }

    /// Normalize and load a raw borrower export.
    #[instrument(skip_all)]
    pub async fn load_borrowers(&self, reader: impl Read) -> Result<LoadReport> {
        let borrowers: Vec<Borrower> = read_raw_borrowers(reader)?;
        self.borrowers.upsert_borrowers(&borrowers).await.or_raise(|| ErrorKind::Store)?;
        info!(borrowers = borrowers.len(), "borrowers loaded");
        Ok(LoadReport { borrowers: borrowers.len(), ..LoadReport::default() })
    }

    /// Load whichever of the two exports exist on disk.
    ///
    /// A missing file is logged and skipped so a catalog-only or
    /// borrower-only refresh does not need a placeholder for the other.
    /// Any other open failure (permissions, a file where a directory was
    /// expected) is an error, not a skip.
    #[instrument(skip(self))]
    pub async fn load_files(&self, books: &Path, borrowers: &Path) -> Result<LoadReport> {
        let mut report = LoadReport::default();
        match File::open(books) {
            Ok(file) => report = self.load_books(file).await?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(path = %books.display(), "book export not found, skipping");
            },
            Err(e) => return Err(e).or_raise(|| ErrorKind::Io),
        }
        match File::open(borrowers) {
            Ok(file) => report.borrowers = self.load_borrowers(file).await?.borrowers,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(path = %borrowers.display(), "borrower export not found, skipping");
            },
            Err(e) => return Err(e).or_raise(|| ErrorKind::Io),
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const BOOKS: &str = "ISBN10\tTitle\tAuthor\n\
        0000000001\tthe hobbit\tJ. R. R. Tolkien\n\
        0000000002\tgood omens\tTerry Pratchett and Neil Gaiman\n";
    const BORROWERS: &str = "\
        ID0000id,first_name,last_name,address,city,state,phone,ssn\n\
        ID000001,jane,roe,1 Main St,Springfield,IL,5550100,123-45-6789\n";

    async fn loader() -> (Database, Loader) {
        let db = Database::connect_in_memory().await.unwrap();
        let loader = Loader::from(&db);
        (db, loader)
    }

    #[tokio::test]
    async fn test_load_books_and_borrowers() {
        let (db, loader) = loader().await;
        let report = loader.load_books(BOOKS.as_bytes()).await.unwrap();
        assert_eq!(report, LoadReport { books: 2, authors: 3, links: 3, borrowers: 0 });
        let report = loader.load_borrowers(BORROWERS.as_bytes()).await.unwrap();
        assert_eq!(report.borrowers, 1);

        let catalog = CatalogRepository::from(&db);
        let book = catalog.get_book("0000000001").await.unwrap().unwrap();
        assert_eq!(book.title, "the hobbit");
        let names: Vec<String> = catalog
            .authors_for_book("0000000002")
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, ["Terry Pratchett", "Neil Gaiman"]);
    }

    #[tokio::test]
    async fn test_reload_is_repeatable() {
        let (db, loader) = loader().await;
        loader.load_books(BOOKS.as_bytes()).await.unwrap();
        loader.load_books(BOOKS.as_bytes()).await.unwrap();
        let catalog = CatalogRepository::from(&db);
        assert_eq!(catalog.count_books().await.unwrap(), 2);
        assert_eq!(catalog.count_authors().await.unwrap(), 3);
        assert_eq!(catalog.count_book_authors().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_load_files_skips_missing_inputs() {
        let (db, loader) = loader().await;
        let dir = tempfile::tempdir().unwrap();
        let books_path = dir.path().join("books.tsv");
        let mut file = File::create(&books_path).unwrap();
        file.write_all(BOOKS.as_bytes()).unwrap();

        let report = loader
            .load_files(&books_path, &dir.path().join("borrowers.csv"))
            .await
            .unwrap();
        assert_eq!(report.books, 2);
        assert_eq!(report.borrowers, 0);
        assert_eq!(BorrowerRepository::from(&db).count_borrowers().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_load_files_surfaces_unreadable_input() {
        let (_db, loader) = loader().await;
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("books.tsv");
        File::create(&blocker).unwrap();
        // A regular file where a directory is expected fails open with
        // NotADirectory rather than NotFound; that must propagate, not
        // be skipped as a missing export.
        let result = loader
            .load_files(&blocker.join("nested.tsv"), &dir.path().join("borrowers.csv"))
            .await;
        assert!(result.is_err());
    }
}
