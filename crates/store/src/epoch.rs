//! Date column encoding.
//!
//! The circulation tables hold civil dates (a checkout happens on a day,
//! not at an instant), stored as midnight-UTC unix timestamps in INTEGER
//! columns. Both engines and repositories go through these two functions
//! so the encoding lives in exactly one place.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use time::{Date, UtcDateTime};

/// Encode a civil date as its midnight-UTC unix timestamp.
pub fn from_date(date: Date) -> i64 {
    date.midnight().as_utc().unix_timestamp()
}

/// Decode a stored timestamp back into a civil date.
pub fn to_date(timestamp: i64) -> Result<Date> {
    Ok(UtcDateTime::from_unix_timestamp(timestamp).or_raise(|| ErrorKind::InvalidData("date"))?.date())
}
