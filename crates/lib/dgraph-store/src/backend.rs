//! Transaction traits the adapter core is written against.
//!
//! A [`GraphBackend`] hands out one [`GraphTxn`] per invocation. Transactions
//! are owned exclusively by their caller and must be closed with either
//! [`GraphTxn::commit`] or [`GraphTxn::discard`]; discarding an already
//! finished transaction is a no-op.

use std::future::Future;

use thiserror::Error;

use crate::models::{
    MutationRequest,
    MutationResponse,
    QueryRequest,
    QueryResponse,
    SchemaOperation,
    TxnMode,
};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("dgraph transport error: {0}")]
    Transport(String),
    #[error("dgraph returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("dgraph error: {0}")]
    Dgraph(String),
    #[error("malformed dgraph response: {0}")]
    Decode(String),
    #[error("transaction already finished")]
    TxnFinished,
    #[error("read-only transaction cannot be mutated or committed")]
    ReadOnly,
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Connection-level handle shared by every invocation.
///
/// Implementations must be safe for concurrent use by independent
/// transactions.
pub trait GraphBackend: Send + Sync + 'static {
    type Txn: GraphTxn;

    /// Opens a new transaction. No network traffic happens until the first
    /// operation.
    fn new_txn(&self, mode: TxnMode) -> Self::Txn;

    /// Applies a schema alteration. Takes effect immediately and globally.
    fn alter(
        &self,
        operation: &SchemaOperation,
    ) -> impl Future<Output = BackendResult<()>> + Send;
}

/// A single backend transaction.
pub trait GraphTxn: Send + 'static {
    fn query(
        &mut self,
        request: &QueryRequest,
    ) -> impl Future<Output = BackendResult<QueryResponse>> + Send;

    fn mutate(
        &mut self,
        request: &MutationRequest,
    ) -> impl Future<Output = BackendResult<MutationResponse>> + Send;

    fn commit(&mut self) -> impl Future<Output = BackendResult<()>> + Send;

    fn discard(&mut self) -> impl Future<Output = BackendResult<()>> + Send;
}
