use thiserror::Error;

use core_types::{BatchId, BatchStatus, ErrorKind, PrincipalId};

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("batch type must not be empty")]
    EmptyBatchType,
    #[error("origin location must not be empty")]
    EmptyOrigin,
    #[error("quantity must be greater than zero")]
    ZeroQuantity,
    #[error("caller {caller} is not an active registered participant")]
    NotRegistered { caller: PrincipalId },
    #[error("caller {caller} is neither the owner of batch {batch_id} nor an overseer")]
    NotAuthorized {
        caller: PrincipalId,
        batch_id: BatchId,
    },
    #[error("unknown batch {batch_id}")]
    UnknownBatch { batch_id: BatchId },
    #[error("illegal status transition {from} -> {to}")]
    IllegalTransition {
        from: BatchStatus,
        to: BatchStatus,
    },
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::EmptyBatchType
            | LedgerError::EmptyOrigin
            | LedgerError::ZeroQuantity => ErrorKind::Validation,
            LedgerError::NotRegistered { .. } | LedgerError::NotAuthorized { .. } => {
                ErrorKind::Authorization
            }
            LedgerError::UnknownBatch { .. } => ErrorKind::NotFound,
            LedgerError::IllegalTransition { .. } => ErrorKind::State,
        }
    }
}
