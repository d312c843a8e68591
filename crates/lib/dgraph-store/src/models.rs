use std::collections::BTreeMap;

use serde::Serialize;

/// Access mode requested when a transaction is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnMode {
    ReadOnly,
    ReadWrite,
}

impl TxnMode {
    #[must_use]
    pub const fn is_read_only(self) -> bool {
        matches!(self, Self::ReadOnly)
    }
}

/// A DQL read query with optional bound variables.
///
/// Dgraph binds every variable as a string, so values are kept as text and
/// names carry the `$` sigil.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, String>,
}

impl QueryRequest {
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_variables(mut self, variables: BTreeMap<String, String>) -> Self {
        self.variables.extend(variables);
        self
    }
}

/// JSON data document returned by a read query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResponse {
    pub json: String,
}

impl QueryResponse {
    #[must_use]
    pub fn new(json: impl Into<String>) -> Self {
        Self { json: json.into() }
    }
}

/// N-Quad statements to set, plus whether to commit in the same round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRequest {
    pub set_nquads: String,
    pub commit_now: bool,
}

impl MutationRequest {
    #[must_use]
    pub fn new(set_nquads: impl Into<String>) -> Self {
        Self {
            set_nquads: set_nquads.into(),
            commit_now: true,
        }
    }

    #[must_use]
    pub const fn with_commit_now(mut self, commit_now: bool) -> Self {
        self.commit_now = commit_now;
        self
    }
}

/// Outcome of a mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationResponse {
    /// Blank node label to assigned uid.
    pub uids: BTreeMap<String, String>,
    pub committed: bool,
    /// Raw data document as returned by the backend.
    pub raw: String,
}

/// Schema text applied through a non-transactional alter call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaOperation {
    pub schema: String,
}

impl SchemaOperation {
    #[must_use]
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
        }
    }
}
