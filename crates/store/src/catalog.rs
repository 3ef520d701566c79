//! Catalog repository: books, authors, and their association.
//!
//! Pure reference data. The circulation engine only ever asks "does this
//! ISBN exist"; the write side exists for the bulk ingest path and for
//! administrative title correction, which is the one edit a cataloged
//! book permits.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{Author, Book};
use exn::ResultExt;
use sqlx::SqlitePool;

/// Repository for the `books`, `authors`, and `book_authors` tables.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}
impl From<&Database> for CatalogRepository {
    fn from(db: &Database) -> Self {
        Self::new(db.pool().clone())
    }
}
impl CatalogRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Whether an ISBN is cataloged. The circulation engine's existence
    /// check runs inside its own checkout transaction; this standalone
    /// form is for callers outside the core.
    pub async fn book_exists(&self, isbn: impl AsRef<str>) -> Result<bool> {
        let exists: i64 = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM books WHERE isbn = ?1)")
            .bind(isbn.as_ref())
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(exists != 0)
    }

    /// Fetch a single catalog entry.
    pub async fn get_book(&self, isbn: impl AsRef<str>) -> Result<Option<Book>> {
        sqlx::query_as(include_str!("../queries/get_book.sql"))
            .bind(isbn.as_ref())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    /// Insert a book, or correct its title if the ISBN is already cataloged.
    pub async fn upsert_book(&self, book: &Book) -> Result<()> {
        sqlx::query(include_str!("../queries/upsert_book.sql"))
            .bind(&book.isbn)
            .bind(&book.title)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    /// Insert or update a batch of books in one transaction.
    pub async fn upsert_books(&self, books: &[Book]) -> Result<()> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        for book in books {
            sqlx::query(include_str!("../queries/upsert_book.sql"))
                .bind(&book.isbn)
                .bind(&book.title)
                .execute(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    /// Insert or update a batch of authors in one transaction.
    pub async fn upsert_authors(&self, authors: &[Author]) -> Result<()> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        for author in authors {
            sqlx::query(include_str!("../queries/upsert_author.sql"))
                .bind(author.author_id)
                .bind(&author.name)
                .execute(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    /// Associate books with authors in one transaction.
    ///
    /// Both sides must already exist; a dangling reference surfaces as
    /// [`ErrorKind::Constraint`]. Re-linking an existing pair is a no-op.
    pub async fn link_book_authors(&self, links: &[(String, i64)]) -> Result<()> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        for (isbn, author_id) in links {
            let result = sqlx::query(include_str!("../queries/link_book_author.sql"))
                .bind(isbn)
                .bind(author_id)
                .execute(&mut *tx)
                .await;
            match result {
                Ok(_) => {},
                Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => {
                    exn::bail!(ErrorKind::Constraint)
                },
                Err(e) => return Err(e).or_raise(|| ErrorKind::Database),
            }
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    /// Authors credited on a book, in author-id order.
    pub async fn authors_for_book(&self, isbn: impl AsRef<str>) -> Result<Vec<Author>> {
        sqlx::query_as(include_str!("../queries/authors_for_book.sql"))
            .bind(isbn.as_ref())
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    /// Count cataloged books.
    pub async fn count_books(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(count as u64)
    }

    /// Count known authors.
    pub async fn count_authors(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM authors")
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(count as u64)
    }

    /// Count book-author associations.
    pub async fn count_book_authors(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_authors")
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(count as u64)
    }
}
