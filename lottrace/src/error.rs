use thiserror::Error;

use core_types::ErrorKind;
use ledger::LedgerError;
use registry::RegistryError;
use transfer::TransferError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Registry(e) => e.kind(),
            Error::Ledger(e) => e.kind(),
            Error::Transfer(e) => e.kind(),
        }
    }
}
