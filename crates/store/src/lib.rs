//! SQLite persistence for library circulation records.
//!
//! This crate owns the database schema and the reference-data side of the
//! system: catalog (books/authors) and borrowers, which the circulation
//! core reads but never drives. The behavioral tables (`loans`, `fines`)
//! are created here too — the schema is one unit, including the partial
//! unique index that makes "at most one open loan per ISBN" a store-level
//! guarantee — but their operations live in the `stacks-circulation`
//! crate, which owns loan and fine lifecycles outright.

mod borrowers;
mod catalog;
mod db;
pub mod epoch;
pub mod error;
mod models;

pub use crate::borrowers::BorrowerRepository;
pub use crate::catalog::CatalogRepository;
pub use crate::db::Database;
pub use crate::models::{Author, Book, Borrower};
