use mission_core::task::ValidationError;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Rejected before any write.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),
    /// A referenced row is gone; the transaction was aborted before writing.
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },
    #[error("store failure: {0}")]
    Store(#[from] StoreError),
}

impl EngineError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        EngineError::Validation(ValidationError::Invalid(reason.into()))
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
