//! Reference-data models.
//!
//! Books, authors, and borrowers are read-mostly records: the circulation
//! core consults them for existence and never mutates them (the one
//! exception being administrative title correction, which goes through
//! the catalog repository's upsert).
//!
//! The constructors own the shared entity validation: a 10-character ISBN,
//! non-empty names/titles, a 9-digit SSN. The schema repeats these as
//! CHECK constraints, so rows read back from the store decode directly.

use crate::error::{ErrorKind, Result};

/// A cataloged book. One row per ISBN; physical copies are not tracked
/// separately, so the ISBN doubles as the single loanable slot.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Book {
    pub isbn: String,
    pub title: String,
}

impl Book {
    /// Validate and construct a catalog entry.
    pub fn new(isbn: impl Into<String>, title: impl Into<String>) -> Result<Self> {
        let isbn = isbn.into();
        let title = title.into();
        if isbn.chars().count() != 10 {
            exn::bail!(ErrorKind::InvalidData("isbn"));
        }
        if title.trim().is_empty() {
            exn::bail!(ErrorKind::InvalidData("title"));
        }
        Ok(Self { isbn, title })
    }
}

/// A book author. Linked to books through the `book_authors` table.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Author {
    pub author_id: i64,
    pub name: String,
}

impl Author {
    pub fn new(author_id: i64, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            exn::bail!(ErrorKind::InvalidData("author name"));
        }
        Ok(Self { author_id, name })
    }
}

/// A registered borrower. Card id and SSN are immutable identity keys;
/// registration itself happens outside this core.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Borrower {
    pub card_id: String,
    pub ssn: String,
    pub name: String,
    pub address: String,
    pub phone: Option<String>,
}

impl Borrower {
    /// Validate and construct a borrower record.
    ///
    /// The SSN must already be normalized to bare digits (see the ingest
    /// crate for dash stripping); this constructor only verifies it.
    pub fn new(
        card_id: impl Into<String>,
        ssn: impl Into<String>,
        name: impl Into<String>,
        address: impl Into<String>,
        phone: Option<String>,
    ) -> Result<Self> {
        let card_id = card_id.into();
        let ssn = ssn.into();
        let name = name.into();
        if card_id.trim().is_empty() {
            exn::bail!(ErrorKind::InvalidData("card id"));
        }
        if ssn.len() != 9 || !ssn.bytes().all(|b| b.is_ascii_digit()) {
            exn::bail!(ErrorKind::InvalidData("ssn"));
        }
        if name.trim().is_empty() {
            exn::bail!(ErrorKind::InvalidData("borrower name"));
        }
        Ok(Self { card_id, ssn, name, address: address.into(), phone })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("0000000002", "The Pragmatic Programmer", true)]
    #[case("000000002", "Too Short", false)]
    #[case("00000000002", "Too Long", false)]
    #[case("0000000002", "   ", false)]
    fn test_book_validation(#[case] isbn: &str, #[case] title: &str, #[case] ok: bool) {
        assert_eq!(Book::new(isbn, title).is_ok(), ok);
    }

    #[rstest]
    #[case("ID00002", "123456789", "Jane Roe", true)]
    #[case("", "123456789", "Jane Roe", false)]
    #[case("ID00002", "12345678", "Jane Roe", false)]
    #[case("ID00002", "12345678X", "Jane Roe", false)]
    #[case("ID00002", "123-45-678", "Jane Roe", false)]
    #[case("ID00002", "123456789", "", false)]
    fn test_borrower_validation(#[case] card: &str, #[case] ssn: &str, #[case] name: &str, #[case] ok: bool) {
        assert_eq!(Borrower::new(card, ssn, name, "1 Main St", None).is_ok(), ok);
    }

    #[test]
    fn test_author_requires_name() {
        assert!(Author::new(1, "A. A. Milne").is_ok());
        assert!(Author::new(1, " ").is_err());
    }
}
