//! Transaction lifetime management.
//!
//! Every invocation runs inside exactly one backend transaction. The
//! coordinator opens it, races the body against the caller's cancellation
//! token and the configured deadline, and always discards it before the
//! outcome is returned. Discarding after a commit is a no-op on the backend.

use std::future::Future;
use std::panic::{AssertUnwindSafe, resume_unwind};
use std::sync::Arc;
use std::time::Duration;

use dgraph_store::{BackendError, BackendResult, GraphBackend, GraphTxn, TxnMode};
use futures::FutureExt;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::{CoreError, CoreResult};

/// Opens, runs and releases one transaction per invocation.
pub struct TransactionCoordinator<B: GraphBackend> {
    backend: Arc<B>,
    deadline: Option<Duration>,
}

impl<B: GraphBackend> Clone for TransactionCoordinator<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            deadline: self.deadline,
        }
    }
}

impl<B: GraphBackend> TransactionCoordinator<B> {
    #[must_use]
    pub const fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            deadline: None,
        }
    }

    /// Bounds every backend call made through this coordinator.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    #[must_use]
    pub const fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    #[must_use]
    pub const fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Runs `body` inside a fresh transaction.
    ///
    /// The transaction is discarded once `body` finishes, fails, panics, is
    /// cancelled or runs past the deadline. Panics resume after the discard.
    ///
    /// # Errors
    /// Returns `CoreError::Backend` when `body` fails and `CoreError::Cancelled`
    /// when the token fires or the deadline elapses first.
    pub async fn with_transaction<T, F>(
        &self,
        mode: TxnMode,
        cancel: &CancellationToken,
        body: F,
    ) -> CoreResult<T>
    where
        T: Send,
        F: for<'t> FnOnce(&'t mut B::Txn) -> BoxFuture<'t, BackendResult<T>> + Send,
    {
        let mut guard = TxnGuard::new(self.backend.new_txn(mode));
        let outcome = match guard.txn.as_mut() {
            Some(txn) => {
                let work = AssertUnwindSafe(body(txn)).catch_unwind();
                self.bounded(cancel, work).await
            }
            None => Ok(Ok(Err(BackendError::TxnFinished))),
        };
        guard.release().await;

        match outcome {
            Ok(Ok(result)) => result.map_err(CoreError::from),
            Ok(Err(panic)) => resume_unwind(panic),
            Err(err) => Err(err),
        }
    }

    /// Runs a non-transactional backend call under the same cancellation and
    /// deadline rules.
    ///
    /// # Errors
    /// Returns `CoreError::Backend` when the call fails and
    /// `CoreError::Cancelled` when it is interrupted.
    pub async fn run<T, Fut>(&self, cancel: &CancellationToken, call: Fut) -> CoreResult<T>
    where
        Fut: Future<Output = BackendResult<T>> + Send,
    {
        self.bounded(cancel, call).await?.map_err(CoreError::from)
    }

    async fn bounded<Fut: Future>(
        &self,
        cancel: &CancellationToken,
        work: Fut,
    ) -> CoreResult<Fut::Output> {
        let deadline = self.deadline;
        let timed = async move {
            match deadline {
                Some(limit) => tokio::time::timeout(limit, work).await.map_err(|_| {
                    CoreError::Cancelled(format!("deadline of {}ms exceeded", limit.as_millis()))
                }),
                None => Ok(work.await),
            }
        };
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(CoreError::Cancelled("request cancelled by caller".to_string())),
            output = timed => output,
        }
    }
}

/// Owns a live transaction and guarantees it is discarded exactly once.
///
/// [`TxnGuard::release`] discards inline. If the guard is dropped while still
/// holding the transaction, because the invocation future itself was dropped,
/// the discard is handed to the runtime.
struct TxnGuard<T: GraphTxn> {
    txn: Option<T>,
}

impl<T: GraphTxn> TxnGuard<T> {
    const fn new(txn: T) -> Self {
        Self { txn: Some(txn) }
    }

    async fn release(&mut self) {
        if let Some(mut txn) = self.txn.take()
            && let Err(err) = txn.discard().await
        {
            warn!(error = %err, "failed to discard transaction");
        }
    }
}

impl<T: GraphTxn> Drop for TxnGuard<T> {
    fn drop(&mut self) {
        let Some(mut txn) = self.txn.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(err) = txn.discard().await {
                        warn!(error = %err, "failed to discard abandoned transaction");
                    }
                });
            }
            Err(_) => warn!("transaction abandoned outside a runtime; not discarded"),
        }
    }
}
