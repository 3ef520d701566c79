//! The circulation core: loan and fine lifecycles.
//!
//! Two engines share the database pool and a [`CirculationPolicy`]:
//!
//! - [`CirculationEngine`] owns the `loans` table — checkout and return.
//! - [`FineEngine`] owns the `fines` table — recomputation, the overdue
//!   sweep, and settlement.
//!
//! Every operation is one SQLite transaction, so the invariants hold
//! under concurrent callers: the store's partial unique index arbitrates
//! racing checkouts, and SQLite's writer serialization keeps a fine
//! recomputation from interleaving with a payment on the same loan.
//!
//! Loan status ([`classify_status`]) is always derived from dates, never
//! cached, and is the single source of truth the fine engine consumes.

pub mod error;
mod fines;
mod loans;
mod models;
mod money;
mod policy;
mod status;

pub use crate::fines::{FineEngine, FineUpdate};
pub use crate::loans::CirculationEngine;
pub use crate::models::{Fine, Loan};
pub use crate::money::Cents;
pub use crate::policy::CirculationPolicy;
pub use crate::status::{LoanStatus, classify_status, late_days};
