//! Dgraph client over the alpha's HTTP API.
//!
//! Transactions are tracked client-side by `start_ts` plus the conflict keys
//! and predicates reported by each call, mirroring what the official clients
//! send back on `/commit`.

use std::collections::BTreeMap;
use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use tracing::debug;
use url::Url;

use crate::backend::{BackendError, BackendResult, GraphBackend, GraphTxn};
use crate::models::{
    MutationRequest,
    MutationResponse,
    QueryRequest,
    QueryResponse,
    SchemaOperation,
    TxnMode,
};

const AUTH_TOKEN_HEADER: &str = "X-Dgraph-AuthToken";
const ACCESS_TOKEN_HEADER: &str = "X-Dgraph-AccessToken";
const RDF_CONTENT_TYPE: &str = "application/rdf";

/// Connection settings for a Dgraph alpha HTTP endpoint.
#[derive(Debug, Clone)]
pub struct DgraphHttpConfig {
    pub endpoint: Url,
    pub auth_token: Option<String>,
    pub access_token: Option<String>,
}

impl DgraphHttpConfig {
    #[must_use]
    pub fn new(mut endpoint: Url) -> Self {
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }
        Self {
            endpoint,
            auth_token: None,
            access_token: None,
        }
    }

    /// Builds a config from a host address such as `localhost:8080` or
    /// `https://dgraph.internal:8080`. A missing scheme defaults to `http`.
    ///
    /// # Errors
    /// Returns the URL parse error when the address is not a valid URL.
    pub fn from_host(host: &str) -> Result<Self, url::ParseError> {
        let host = host.trim();
        let endpoint = if host.contains("://") {
            Url::parse(host)?
        } else {
            Url::parse(&format!("http://{host}"))?
        };
        Ok(Self::new(endpoint))
    }

    #[must_use]
    pub fn with_auth_token(mut self, token: Option<String>) -> Self {
        self.auth_token = token;
        self
    }

    #[must_use]
    pub fn with_access_token(mut self, token: Option<String>) -> Self {
        self.access_token = token;
        self
    }
}

/// HTTP client state shared by the backend and every transaction it opens.
#[derive(Debug, Clone)]
struct Session {
    client: Client,
    config: Arc<DgraphHttpConfig>,
}

impl Session {
    fn url(&self, path: &str) -> BackendResult<Url> {
        self.config
            .endpoint
            .join(path)
            .map_err(|err| BackendError::Transport(err.to_string()))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let mut builder = self.client.request(method, url);
        if let Some(token) = self.config.auth_token.as_deref() {
            builder = builder.header(AUTH_TOKEN_HEADER, token);
        }
        if let Some(token) = self.config.access_token.as_deref() {
            builder = builder.header(ACCESS_TOKEN_HEADER, token);
        }
        builder
    }

    fn post(&self, url: Url) -> RequestBuilder {
        self.request(Method::POST, url)
    }
}

/// Dgraph backend speaking the alpha HTTP API.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    session: Session,
}

impl HttpBackend {
    /// Builds the client without touching the network.
    ///
    /// # Errors
    /// Returns `BackendError::Transport` if the HTTP client cannot be built.
    pub fn new(config: DgraphHttpConfig) -> BackendResult<Self> {
        let client = Client::builder().build().map_err(transport_error)?;
        Ok(Self {
            session: Session {
                client,
                config: Arc::new(config),
            },
        })
    }

    /// Builds the client and probes `/health` so a bad address fails early.
    ///
    /// # Errors
    /// Returns `BackendError` if the alpha is unreachable or unhealthy.
    pub async fn connect(config: DgraphHttpConfig) -> BackendResult<Self> {
        let backend = Self::new(config)?;
        backend.health().await?;
        Ok(backend)
    }

    /// Checks the alpha's `/health` endpoint.
    ///
    /// # Errors
    /// Returns `BackendError` on transport failure or a non-success status.
    pub async fn health(&self) -> BackendResult<()> {
        let url = self.session.url("health")?;
        let response = self
            .session
            .request(Method::GET, url)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn config(&self) -> &DgraphHttpConfig {
        &self.session.config
    }
}

impl GraphBackend for HttpBackend {
    type Txn = HttpTxn;

    fn new_txn(&self, mode: TxnMode) -> HttpTxn {
        HttpTxn {
            session: self.session.clone(),
            mode,
            start_ts: None,
            keys: Vec::new(),
            preds: Vec::new(),
            state: TxnState::Open,
        }
    }

    async fn alter(&self, operation: &SchemaOperation) -> BackendResult<()> {
        let url = self.session.url("alter")?;
        debug!(bytes = operation.schema.len(), "dgraph alter");
        let builder = self.session.post(url).body(operation.schema.clone());
        send(builder).await?.into_parts()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxnState {
    Open,
    Committed,
    Discarded,
}

/// One Dgraph transaction, identified by the `start_ts` the server assigns on
/// first use.
#[derive(Debug)]
pub struct HttpTxn {
    session: Session,
    mode: TxnMode,
    start_ts: Option<u64>,
    keys: Vec<String>,
    preds: Vec<String>,
    state: TxnState,
}

impl HttpTxn {
    #[must_use]
    pub const fn start_ts(&self) -> Option<u64> {
        self.start_ts
    }

    fn ensure_open(&self) -> BackendResult<()> {
        if self.state == TxnState::Open {
            Ok(())
        } else {
            Err(BackendError::TxnFinished)
        }
    }

    fn append_start_ts(&self, url: &mut Url) {
        if let Some(start_ts) = self.start_ts {
            url.query_pairs_mut()
                .append_pair("startTs", &start_ts.to_string());
        }
    }

    fn absorb(&mut self, context: Option<TxnContext>) {
        let Some(context) = context else {
            return;
        };
        if self.start_ts.is_none() && context.start_ts > 0 {
            self.start_ts = Some(context.start_ts);
        }
        self.keys.extend(context.keys.unwrap_or_default());
        self.preds.extend(context.preds.unwrap_or_default());
    }
}

impl GraphTxn for HttpTxn {
    async fn query(&mut self, request: &QueryRequest) -> BackendResult<QueryResponse> {
        self.ensure_open()?;
        let mut url = self.session.url("query")?;
        self.append_start_ts(&mut url);
        if self.mode.is_read_only() {
            url.query_pairs_mut().append_pair("ro", "true");
        }
        debug!(start_ts = ?self.start_ts, "dgraph query");
        let builder = self.session.post(url).json(request);
        let (data, context) = send(builder).await?.into_parts()?;
        self.absorb(context);
        Ok(QueryResponse::new(raw_text(data)))
    }

    async fn mutate(&mut self, request: &MutationRequest) -> BackendResult<MutationResponse> {
        self.ensure_open()?;
        if self.mode.is_read_only() {
            return Err(BackendError::ReadOnly);
        }
        let mut url = self.session.url("mutate")?;
        self.append_start_ts(&mut url);
        if request.commit_now {
            url.query_pairs_mut().append_pair("commitNow", "true");
        }
        debug!(start_ts = ?self.start_ts, commit_now = request.commit_now, "dgraph mutate");
        let body = format!("{{\n  set {{\n{}\n  }}\n}}", request.set_nquads);
        let builder = self
            .session
            .post(url)
            .header(CONTENT_TYPE, RDF_CONTENT_TYPE)
            .body(body);
        let (data, context) = send(builder).await?.into_parts()?;
        self.absorb(context);
        let raw = raw_text(data);
        let uids = serde_json::from_str::<MutationData>(&raw)
            .map_err(|err| BackendError::Decode(err.to_string()))?
            .uids
            .unwrap_or_default();
        if request.commit_now {
            self.state = TxnState::Committed;
        }
        Ok(MutationResponse {
            uids,
            committed: request.commit_now,
            raw,
        })
    }

    async fn commit(&mut self) -> BackendResult<()> {
        self.ensure_open()?;
        if self.mode.is_read_only() {
            return Err(BackendError::ReadOnly);
        }
        let Some(start_ts) = self.start_ts else {
            self.state = TxnState::Committed;
            return Ok(());
        };
        let mut url = self.session.url("commit")?;
        url.query_pairs_mut()
            .append_pair("startTs", &start_ts.to_string());
        debug!(start_ts, "dgraph commit");
        let body = CommitBody {
            keys: &self.keys,
            preds: &self.preds,
        };
        let builder = self.session.post(url).json(&body);
        send(builder).await?.into_parts()?;
        self.state = TxnState::Committed;
        Ok(())
    }

    async fn discard(&mut self) -> BackendResult<()> {
        if self.state != TxnState::Open {
            return Ok(());
        }
        self.state = TxnState::Discarded;
        // Read-only transactions and untouched ones hold no server-side state.
        let Some(start_ts) = self.start_ts else {
            return Ok(());
        };
        if self.mode.is_read_only() {
            return Ok(());
        }
        let mut url = self.session.url("commit")?;
        url.query_pairs_mut()
            .append_pair("startTs", &start_ts.to_string())
            .append_pair("abort", "true");
        debug!(start_ts, "dgraph abort");
        send(self.session.post(url)).await?.into_parts()?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<Box<RawValue>>,
    #[serde(default)]
    errors: Option<Vec<ErrorEntry>>,
    #[serde(default)]
    extensions: Option<Extensions>,
}

impl Envelope {
    fn into_parts(self) -> BackendResult<(Option<Box<RawValue>>, Option<TxnContext>)> {
        if let Some(errors) = self.errors.filter(|errors| !errors.is_empty()) {
            let message = errors
                .into_iter()
                .map(|entry| entry.message)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(BackendError::Dgraph(message));
        }
        Ok((self.data, self.extensions.and_then(|ext| ext.txn)))
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEntry {
    message: String,
}

#[derive(Debug, Deserialize)]
struct Extensions {
    #[serde(default)]
    txn: Option<TxnContext>,
}

#[derive(Debug, Deserialize)]
struct TxnContext {
    #[serde(default)]
    start_ts: u64,
    #[serde(default)]
    keys: Option<Vec<String>>,
    #[serde(default)]
    preds: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct MutationData {
    #[serde(default)]
    uids: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Serialize)]
struct CommitBody<'a> {
    keys: &'a [String],
    preds: &'a [String],
}

async fn send(builder: RequestBuilder) -> BackendResult<Envelope> {
    let response = builder.send().await.map_err(transport_error)?;
    let status = response.status();
    let body = response.text().await.map_err(transport_error)?;
    if !status.is_success() {
        return Err(BackendError::Status {
            status: status.as_u16(),
            body,
        });
    }
    serde_json::from_str(&body).map_err(|err| BackendError::Decode(err.to_string()))
}

fn raw_text(data: Option<Box<RawValue>>) -> String {
    data.map_or_else(|| "{}".to_string(), |raw| raw.get().to_string())
}

fn transport_error(err: reqwest::Error) -> BackendError {
    BackendError::Transport(err.to_string())
}
