//! Currency as whole cents.
//!
//! The fines column is decimal(6,2) money; scaling by 100 into an integer
//! keeps the arithmetic exact and the column an INTEGER.

use crate::error::{ErrorKind, Result};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// A non-negative amount of money in whole cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cents(i64);

impl Cents {
    pub const ZERO: Self = Self(0);

    /// Const constructor for policy tables and tests; `u32` keeps it
    /// non-negative by type.
    pub const fn of(cents: u32) -> Self {
        Self(cents as i64)
    }

    /// Fallible constructor for values read back from storage or callers.
    pub fn new(cents: i64) -> Result<Self> {
        if cents < 0 {
            exn::bail!(ErrorKind::NegativeAmount);
        }
        Ok(Self(cents))
    }

    /// Raw cent count, for binding into queries.
    pub fn total_cents(&self) -> i64 {
        self.0
    }

    /// Multiply by a day count, saturating far beyond any realistic cap.
    pub fn times(self, n: u32) -> Self {
        Self(self.0.saturating_mul(i64::from(n)))
    }
}

impl Display for Cents {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}
