use thiserror::Error;

use core_types::{BatchId, BatchStatus, ErrorKind, PrincipalId, RequestId};
use ledger::LedgerError;

pub type Result<T> = std::result::Result<T, TransferError>;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("caller {caller} is not the owner of batch {batch_id}")]
    NotOwner {
        caller: PrincipalId,
        batch_id: BatchId,
    },
    #[error("cannot transfer a batch to its current owner")]
    SelfTransfer,
    #[error("{to} is not an active registered participant")]
    CounterpartyNotRegistered { to: PrincipalId },
    #[error("transfer already pending for batch {batch_id}")]
    AlreadyPending { batch_id: BatchId },
    #[error("batch {batch_id} is {status}, custody can no longer change")]
    TerminalBatch {
        batch_id: BatchId,
        status: BatchStatus,
    },
    #[error("transfer reason must not be empty")]
    EmptyReason,
    #[error("unknown transfer request {request_id}")]
    UnknownRequest { request_id: RequestId },
    #[error("transfer request {request_id} is no longer active")]
    RequestInactive { request_id: RequestId },
    #[error("caller {caller} is not the recipient of request {request_id}")]
    NotRecipient {
        caller: PrincipalId,
        request_id: RequestId,
    },
    #[error("caller {caller} did not initiate request {request_id}")]
    NotRequester {
        caller: PrincipalId,
        request_id: RequestId,
    },
    #[error("ownership of batch {batch_id} changed while request {request_id} was pending")]
    OwnerChanged {
        batch_id: BatchId,
        request_id: RequestId,
    },
    #[error("no active transfer request for batch {batch_id}")]
    NoActiveRequest { batch_id: BatchId },
}

impl TransferError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransferError::Ledger(inner) => inner.kind(),
            TransferError::SelfTransfer
            | TransferError::CounterpartyNotRegistered { .. }
            | TransferError::EmptyReason => ErrorKind::Validation,
            TransferError::NotOwner { .. }
            | TransferError::NotRecipient { .. }
            | TransferError::NotRequester { .. } => ErrorKind::Authorization,
            TransferError::AlreadyPending { .. }
            | TransferError::TerminalBatch { .. }
            | TransferError::RequestInactive { .. }
            | TransferError::OwnerChanged { .. } => ErrorKind::State,
            TransferError::UnknownRequest { .. } | TransferError::NoActiveRequest { .. } => {
                ErrorKind::NotFound
            }
        }
    }
}
