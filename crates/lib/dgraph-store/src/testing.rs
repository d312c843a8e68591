//! In-memory backend that records every call, for tests of the adapter core.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::backend::{BackendError, BackendResult, GraphBackend, GraphTxn};
use crate::models::{
    MutationRequest,
    MutationResponse,
    QueryRequest,
    QueryResponse,
    SchemaOperation,
    TxnMode,
};

/// Snapshot of what a [`RecordingBackend`] has seen.
#[derive(Debug, Clone, Default)]
pub struct Recorded {
    pub opened: usize,
    pub discarded: usize,
    pub committed: usize,
    pub modes: Vec<TxnMode>,
    pub queries: Vec<QueryRequest>,
    pub mutations: Vec<MutationRequest>,
    pub alters: Vec<SchemaOperation>,
}

#[derive(Debug, Default)]
struct Script {
    query_responses: VecDeque<Result<String, String>>,
    default_query_response: Option<String>,
    mutation_error: Option<String>,
    alter_error: Option<String>,
    pending_queries: bool,
    panicking_queries: bool,
}

#[derive(Debug, Default)]
struct Shared {
    recorded: Recorded,
    script: Script,
}

/// Scriptable backend that counts transactions and records requests.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    shared: Arc<Mutex<Shared>>,
}

impl RecordingBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every query without a queued response returns this document.
    #[must_use]
    pub fn with_query_response(self, json: impl Into<String>) -> Self {
        self.lock().script.default_query_response = Some(json.into());
        self
    }

    /// Queues a one-shot query response, consumed in order.
    #[must_use]
    pub fn push_query_response(self, json: impl Into<String>) -> Self {
        self.lock().script.query_responses.push_back(Ok(json.into()));
        self
    }

    /// Queues a one-shot query failure.
    #[must_use]
    pub fn push_query_error(self, message: impl Into<String>) -> Self {
        self.lock()
            .script
            .query_responses
            .push_back(Err(message.into()));
        self
    }

    #[must_use]
    pub fn with_mutation_error(self, message: impl Into<String>) -> Self {
        self.lock().script.mutation_error = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_alter_error(self, message: impl Into<String>) -> Self {
        self.lock().script.alter_error = Some(message.into());
        self
    }

    /// Queries never resolve; used to exercise cancellation and deadlines.
    #[must_use]
    pub fn with_pending_queries(self) -> Self {
        self.lock().script.pending_queries = true;
        self
    }

    /// Queries panic inside the backend call.
    #[must_use]
    pub fn with_panicking_queries(self) -> Self {
        self.lock().script.panicking_queries = true;
        self
    }

    #[must_use]
    pub fn recorded(&self) -> Recorded {
        self.lock().recorded.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl GraphBackend for RecordingBackend {
    type Txn = RecordingTxn;

    fn new_txn(&self, mode: TxnMode) -> RecordingTxn {
        {
            let mut shared = self.lock();
            shared.recorded.opened += 1;
            shared.recorded.modes.push(mode);
        }
        RecordingTxn {
            backend: self.clone(),
            mode,
            finished: false,
        }
    }

    async fn alter(&self, operation: &SchemaOperation) -> BackendResult<()> {
        let mut shared = self.lock();
        shared.recorded.alters.push(operation.clone());
        match shared.script.alter_error.clone() {
            Some(message) => Err(BackendError::Dgraph(message)),
            None => Ok(()),
        }
    }
}

/// Transaction handed out by [`RecordingBackend`].
#[derive(Debug)]
pub struct RecordingTxn {
    backend: RecordingBackend,
    mode: TxnMode,
    finished: bool,
}

impl GraphTxn for RecordingTxn {
    async fn query(&mut self, request: &QueryRequest) -> BackendResult<QueryResponse> {
        let (next, pending, panicking) = {
            let mut shared = self.backend.lock();
            shared.recorded.queries.push(request.clone());
            let next = shared.script.query_responses.pop_front();
            let next = next.unwrap_or_else(|| {
                Ok(shared
                    .script
                    .default_query_response
                    .clone()
                    .unwrap_or_else(|| "{}".to_string()))
            });
            (
                next,
                shared.script.pending_queries,
                shared.script.panicking_queries,
            )
        };
        assert!(!panicking, "scripted query panic");
        if pending {
            std::future::pending::<()>().await;
        }
        next.map(QueryResponse::new).map_err(BackendError::Dgraph)
    }

    async fn mutate(&mut self, request: &MutationRequest) -> BackendResult<MutationResponse> {
        if self.finished {
            return Err(BackendError::TxnFinished);
        }
        if self.mode.is_read_only() {
            return Err(BackendError::ReadOnly);
        }
        let mut shared = self.backend.lock();
        shared.recorded.mutations.push(request.clone());
        if let Some(message) = shared.script.mutation_error.clone() {
            return Err(BackendError::Dgraph(message));
        }
        if request.commit_now {
            shared.recorded.committed += 1;
            self.finished = true;
        }
        Ok(MutationResponse {
            uids: std::collections::BTreeMap::new(),
            committed: request.commit_now,
            raw: r#"{"code":"Success","message":"Done"}"#.to_string(),
        })
    }

    async fn commit(&mut self) -> BackendResult<()> {
        if self.finished {
            return Err(BackendError::TxnFinished);
        }
        self.finished = true;
        self.backend.lock().recorded.committed += 1;
        Ok(())
    }

    async fn discard(&mut self) -> BackendResult<()> {
        self.finished = true;
        self.backend.lock().recorded.discarded += 1;
        Ok(())
    }
}
