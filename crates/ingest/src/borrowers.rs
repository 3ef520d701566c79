//! Raw borrower export parsing.
//!
//! The source is a comma-separated registration export with split name and
//! address parts and dash-formatted SSNs. Each row collapses into one
//! borrower record: `first_name`/`last_name` join into a display name,
//! `address`/`city`/`state` into a single mailing line, and the SSN is
//! reduced to bare digits before validation.

use crate::error::{ErrorKind, Result};
use crate::normalize::{normalize_ssn, normalize_whitespace, title_case};
use exn::ResultExt;
use serde::Deserialize;
use stacks_store::Borrower;
use std::collections::HashSet;
use std::io::Read;

#[derive(Debug, Deserialize)]
struct RawBorrowerRecord {
    #[serde(rename = "ID0000id")]
    card_id: String,
    first_name: String,
    last_name: String,
    #[serde(default)]
    address: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    phone: Option<String>,
    ssn: String,
}

impl RawBorrowerRecord {
    fn into_borrower(self) -> Result<Borrower> {
        let card_id = normalize_whitespace(&self.card_id);
        let name = title_case(&format!("{} {}", self.first_name, self.last_name));
        let address = [self.address, self.city, self.state]
            .map(|part| normalize_whitespace(&part))
            .join(", ");
        let address = address.trim_matches([' ', ',']).to_string();
        let phone = self
            .phone
            .as_deref()
            .map(normalize_whitespace)
            .filter(|p| !p.is_empty());
        let ssn = normalize_ssn(&self.ssn);
        Borrower::new(card_id.clone(), ssn, name, address, phone)
            .or_raise(|| ErrorKind::InvalidRecord { table: "borrower", detail: card_id })
    }
}

/// Parse a raw comma-separated borrower export.
///
/// Duplicate card ids keep the first row seen; a malformed row (bad SSN,
/// missing name) fails the whole read since partial registrations would
/// leave loans unattributable.
pub fn read_raw_borrowers(reader: impl Read) -> Result<Vec<Borrower>> {
    let mut csv = csv::Reader::from_reader(reader);
    let mut seen = HashSet::new();
    let mut borrowers = Vec::new();
    for record in csv.deserialize() {
        let record: RawBorrowerRecord = record.or_raise(|| ErrorKind::Csv("borrower"))?;
        let borrower = record.into_borrower()?;
        if seen.insert(borrower.card_id.clone()) {
            borrowers.push(borrower);
        }
    }
    Ok(borrowers)
}
