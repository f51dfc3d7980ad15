//! DFS Recon — reconciliation core for the DFS station portal.
//!
//! This crate carries the two load-bearing pieces of the back-office portal:
//! the daily sales reconciliation calculator (cash short/over against the
//! counted drawer) and the report draft store (save/resume of an in-progress
//! daily report, keyed by station + report date, with a fixed TTL).
//!
//! Everything else in the portal — routing, auth, table CRUD, imports — is
//! plumbing over the hosted API and lives outside this crate. The calculator
//! takes a plain figures record and returns a plain result; the draft store
//! talks to an abstract key-value backend. Neither depends on the other; the
//! UI composes them.
//!
//! All currency amounts are integer cents (`Cents`), never binary floating
//! point, so the exact-zero drawer comparison is exact.

mod draft;
mod kv;
mod money;
mod reconcile;
mod report;
mod validate;

pub use draft::{
    Clock, DraftInfo, DraftStore, DraftSummary, SystemClock, DEFAULT_DRAFT_TTL_HOURS,
    DRAFT_KEY_PREFIX,
};
pub use kv::{KvStore, MemoryKv, SqliteKv};
pub use money::Cents;
pub use reconcile::{
    cash_expense_total, reconcile, DrawerStatus, ExpenseEntry, PaymentMethod,
    ReconciliationResult, ShiftFigures,
};
pub use report::apply_to_report;
pub use validate::validate;
