//! Raw book export parsing.
//!
//! The source is a tab-separated export with (at least) `ISBN10`, `Title`,
//! and `Author` columns. One input row fans out into up to three tables:
//! the book itself, any authors not yet seen, and the links between them.

use crate::error::{ErrorKind, Result};
use crate::normalize::{normalize_whitespace, split_authors};
use exn::ResultExt;
use serde::Deserialize;
use stacks_store::{Author, Book};
use std::collections::{HashMap, HashSet};
use std::io::Read;

#[derive(Debug, Deserialize)]
struct RawBookRecord {
    #[serde(rename = "ISBN10")]
    isbn: String,
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Author", default)]
    author: Option<String>,
}

/// Everything extracted from one raw book export, ready to load.
#[derive(Debug, Default)]
pub struct CatalogBatch {
    pub books: Vec<Book>,
    pub authors: Vec<Author>,
    /// (isbn, author_id) association pairs, de-duplicated.
    pub links: Vec<(String, i64)>,
}

/// Parse a raw tab-separated book export into a loadable batch.
///
/// - Rows without an ISBN10 are dropped (it is the canonical key).
/// - Duplicate ISBNs keep the first row seen.
/// - Author names are split, cleaned, and assigned sequential ids in
///   first-appearance order; the same name (case-insensitively) across
///   rows maps to one id.
pub fn read_raw_books(reader: impl Read) -> Result<CatalogBatch> {
    let mut csv = csv::ReaderBuilder::new().delimiter(b'\t').from_reader(reader);
    let mut batch = CatalogBatch::default();
    let mut seen_isbns = HashSet::new();
    let mut author_ids: HashMap<String, i64> = HashMap::new();
    let mut seen_links = HashSet::new();
    for record in csv.deserialize() {
        let record: RawBookRecord = record.or_raise(|| ErrorKind::Csv("book"))?;
        let isbn = normalize_whitespace(&record.isbn);
        if isbn.is_empty() {
            continue;
        }
        if seen_isbns.insert(isbn.clone()) {
            let title = normalize_whitespace(&record.title);
            let book = Book::new(isbn.clone(), title)
                .or_raise(|| ErrorKind::InvalidRecord { table: "book", detail: isbn.clone() })?;
            batch.books.push(book);
        }
        for name in split_authors(record.author.as_deref().unwrap_or_default()) {
            let key = name.to_lowercase();
            let next_id = author_ids.len() as i64 + 1;
            let author_id = match author_ids.get(&key) {
                Some(id) => *id,
                None => {
                    author_ids.insert(key, next_id);
                    let author = Author::new(next_id, name)
                        .or_raise(|| ErrorKind::InvalidRecord { table: "author", detail: isbn.clone() })?;
                    batch.authors.push(author);
                    next_id
                },
            };
            if seen_links.insert((isbn.clone(), author_id)) {
                batch.links.push((isbn.clone(), author_id));
            }
        }
    }
    Ok(batch)
}
