use dgraph_store::{GraphBackend, GraphTxn, TxnMode};
use tokio_util::sync::CancellationToken;

use crate::args::{AlterSchemaParams, MutateParams, QueryParams, SearchMoviesParams};
use crate::error::CoreResult;
use crate::invocation::ToolOutput;
use crate::translate;

use super::DgraphControlPlane;

impl<B: GraphBackend> DgraphControlPlane<B> {
    /// Runs a caller-supplied read query and returns its JSON data document.
    ///
    /// # Errors
    /// Returns `CoreError` if the query fails or is cancelled.
    pub async fn run_query(
        &self,
        params: QueryParams,
        cancel: &CancellationToken,
    ) -> CoreResult<ToolOutput> {
        let request = translate::query_request(params);
        let response = self
            .coordinator
            .with_transaction(TxnMode::ReadOnly, cancel, move |txn| {
                Box::pin(async move { txn.query(&request).await })
            })
            .await?;
        Ok(ToolOutput::text(response.json))
    }

    /// Applies N-Quads. Without `commit` the mutation is discarded along with
    /// its transaction.
    ///
    /// # Errors
    /// Returns `CoreError` if the mutation fails or is cancelled.
    pub async fn mutate(
        &self,
        params: MutateParams,
        cancel: &CancellationToken,
    ) -> CoreResult<ToolOutput> {
        let request = translate::mutation_request(params);
        let response = self
            .coordinator
            .with_transaction(TxnMode::ReadWrite, cancel, move |txn| {
                Box::pin(async move { txn.mutate(&request).await })
            })
            .await?;
        let text = if response.committed {
            format!("Mutation successful. Response: {}", response.raw)
        } else {
            format!(
                "Mutation applied without commit and discarded. Response: {}",
                response.raw
            )
        };
        Ok(ToolOutput::text(text))
    }

    /// Applies a schema alteration. Takes effect immediately.
    ///
    /// # Errors
    /// Returns `CoreError` if the alteration fails or is cancelled.
    pub async fn alter_schema(
        &self,
        params: AlterSchemaParams,
        cancel: &CancellationToken,
    ) -> CoreResult<ToolOutput> {
        let operation = translate::schema_operation(params);
        let backend = self.coordinator.backend().clone();
        self.coordinator
            .run(cancel, async move { backend.alter(&operation).await })
            .await?;
        Ok(ToolOutput::text("Schema updated successfully"))
    }

    /// Runs the derived movie search.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidArgument` for an unusable term, otherwise
    /// `CoreError` if the query fails or is cancelled.
    pub async fn search_movies(
        &self,
        params: SearchMoviesParams,
        cancel: &CancellationToken,
    ) -> CoreResult<ToolOutput> {
        let request = translate::search_request(&params.search_term, params.search_type)?;
        let response = self
            .coordinator
            .with_transaction(TxnMode::ReadOnly, cancel, move |txn| {
                Box::pin(async move { txn.query(&request).await })
            })
            .await?;
        Ok(ToolOutput::text(response.json))
    }

    #[must_use]
    pub fn health() -> ToolOutput {
        ToolOutput::text("ok")
    }
}
