use std::sync::Arc;
use std::time::Duration;

use dgraph_store::GraphBackend;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::args::{AlterSchemaParams, MutateParams, QueryParams, SearchMoviesParams, ToolParams};
use crate::dispatch::{DispatchTable, ToolKind};
use crate::error::{CoreError, CoreResult};
use crate::invocation::{ToolInvocation, ToolOutput};
use crate::resources::ResourceResolver;
use crate::txn::TransactionCoordinator;

pub mod resources;
pub mod tools;

/// Entry point for tool and resource invocations against one backend.
pub struct DgraphControlPlane<B: GraphBackend> {
    coordinator: TransactionCoordinator<B>,
    tools: Arc<DispatchTable>,
    resources: Arc<ResourceResolver>,
}

impl<B: GraphBackend> Clone for DgraphControlPlane<B> {
    fn clone(&self) -> Self {
        Self {
            coordinator: self.coordinator.clone(),
            tools: self.tools.clone(),
            resources: self.resources.clone(),
        }
    }
}

impl<B: GraphBackend> DgraphControlPlane<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            coordinator: TransactionCoordinator::new(backend),
            tools: Arc::new(DispatchTable::new()),
            resources: Arc::new(ResourceResolver::new()),
        }
    }

    /// Bounds every backend call. `None` disables the deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.coordinator = self.coordinator.with_deadline(deadline);
        self
    }

    pub const fn coordinator(&self) -> &TransactionCoordinator<B> {
        &self.coordinator
    }

    pub fn tools(&self) -> &DispatchTable {
        &self.tools
    }

    pub fn resources(&self) -> &ResourceResolver {
        &self.resources
    }

    /// Routes a tool invocation to its handler.
    ///
    /// # Errors
    /// Returns `CoreError::NotFound` for an unknown tool,
    /// `CoreError::InvalidArgument` when validation fails, and
    /// `CoreError::Backend` or `CoreError::Cancelled` when execution fails.
    pub async fn invoke(
        &self,
        invocation: &ToolInvocation,
        cancel: &CancellationToken,
    ) -> CoreResult<ToolOutput> {
        let kind = self.tools.lookup(&invocation.name)?.kind;
        debug!(tool = %invocation.name, "tool invocation");
        let args = &invocation.arguments;
        let result = match kind {
            ToolKind::Query => self.run_query(QueryParams::from_arguments(args)?, cancel).await,
            ToolKind::Mutate => self.mutate(MutateParams::from_arguments(args)?, cancel).await,
            ToolKind::AlterSchema => {
                self.alter_schema(AlterSchemaParams::from_arguments(args)?, cancel)
                    .await
            }
            ToolKind::SearchMovies => {
                self.search_movies(SearchMoviesParams::from_arguments(args)?, cancel)
                    .await
            }
            ToolKind::Health => Ok(Self::health()),
        };
        if let Err(err @ (CoreError::Backend(_) | CoreError::Cancelled(_))) = &result {
            warn!(tool = %invocation.name, error = %err, "tool invocation failed");
        }
        result
    }
}
