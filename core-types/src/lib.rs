//! Shared identifiers, role/status vocabulary, and the error taxonomy for
//! the custody tracking core.

pub mod error;
pub mod status;
pub mod types;

pub use error::ErrorKind;
pub use status::BatchStatus;
pub use types::{BatchId, PrincipalId, RequestId, Role};
