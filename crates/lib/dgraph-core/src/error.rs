use dgraph_store::BackendError;
use thiserror::Error;

/// Failure taxonomy surfaced to invocation callers.
///
/// `InvalidArgument` and `NotFound` are raised before any transaction is
/// opened. `Backend` and `Cancelled` are raised after the open transaction has
/// been discarded.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("cancelled: {0}")]
    Cancelled(String),
}

impl CoreError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
