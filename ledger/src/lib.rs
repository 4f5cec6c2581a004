//! Batch ledger: owns batch records, enforces the lifecycle state machine,
//! and maintains the per-batch ownership history.
//!
//! The crate exposes:
//! - [`BatchLedger`]: keyed batch store with registration and status updates.
//! - [`OwnershipHistory`]: append-only owner sequence per batch.
//! - [`Batch`]: the record itself.

pub mod batch;
pub mod error;
pub mod history;
mod ledger;

pub use batch::Batch;
pub use error::{LedgerError, Result};
pub use history::OwnershipHistory;
pub use ledger::BatchLedger;
