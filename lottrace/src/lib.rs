//! Custody and condition tracking for discrete physical lots.
//!
//! The crate exposes:
//! - [`CustodyController`]: the single entry point; serializes writes and
//!   serves snapshot reads over the composed registry/ledger/transfer state.
//! - [`CustodyConfig`]: construction-time configuration (admin principal,
//!   change-feed capacity).
//! - The record and error types of the underlying components, re-exported.

pub mod config;
pub mod controller;
pub mod error;

pub use audit::{AuditAction, AuditEntry, ChangeEvent};
pub use config::CustodyConfig;
pub use controller::CustodyController;
pub use core_types::{BatchId, BatchStatus, ErrorKind, PrincipalId, RequestId, Role};
pub use error::{Error, Result};
pub use ledger::Batch;
pub use registry::Participant;
pub use transfer::TransferRequest;
