use dgraph_store::{GraphBackend, GraphTxn, TxnMode};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::CoreResult;
use crate::invocation::ResourceOutput;

use super::DgraphControlPlane;

impl<B: GraphBackend> DgraphControlPlane<B> {
    /// Reads a resource by URI.
    ///
    /// # Errors
    /// Returns `CoreError::NotFound` for an unregistered URI,
    /// `CoreError::InvalidArgument` for a malformed movie id, otherwise
    /// `CoreError` if the read fails or is cancelled.
    pub async fn read_resource(
        &self,
        uri: &str,
        cancel: &CancellationToken,
    ) -> CoreResult<ResourceOutput> {
        let resolved = self.resources.resolve(uri)?;
        let request = resolved.query_request()?;
        debug!(%uri, "resource read");
        let response = self
            .coordinator
            .with_transaction(TxnMode::ReadOnly, cancel, move |txn| {
                Box::pin(async move { txn.query(&request).await })
            })
            .await
            .inspect_err(|err| warn!(%uri, error = %err, "resource read failed"))?;
        Ok(ResourceOutput {
            uri: uri.to_string(),
            mime_type: resolved.mime_type(),
            text: response.json,
        })
    }
}
