//! Reference-data ingest: normalize raw exports and bulk-load the store.
//!
//! The pipeline is read, normalize, upsert:
//!
//! - [`read_raw_books`] parses the tab-separated catalog export, splitting
//!   multi-author fields and assigning author ids in first-seen order.
//! - [`read_raw_borrowers`] parses the registration export, joining split
//!   name and address parts and stripping SSN formatting.
//! - [`Loader`] writes each batch through the store repositories as one
//!   transaction per table; [`TableCounts`] checks the result.
//!
//! Loads are keyed upserts, so a corrected export can be replayed without
//! duplicating rows.

mod borrowers;
mod catalog;
mod counts;
pub mod error;
mod load;
pub mod normalize;

pub use crate::borrowers::read_raw_borrowers;
pub use crate::catalog::{CatalogBatch, read_raw_books};
pub use crate::counts::TableCounts;
pub use crate::load::{LoadReport, Loader};
