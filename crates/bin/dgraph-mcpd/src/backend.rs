use std::sync::Arc;

use dgraph_core::DgraphControlPlane;
use dgraph_store::{BackendError, HttpBackend};
use tracing::info;

use crate::config::DgraphMcpConfig;

/// Connects to the configured alpha and wraps it in a control plane.
///
/// # Errors
/// Returns `BackendError` when the alpha's health probe fails.
pub async fn build_control(
    config: &DgraphMcpConfig,
) -> Result<Arc<DgraphControlPlane<HttpBackend>>, BackendError> {
    let backend = HttpBackend::connect(config.dgraph.clone()).await?;
    info!(endpoint = %config.dgraph.endpoint, "connected to dgraph");
    let control = DgraphControlPlane::new(Arc::new(backend)).with_deadline(config.request_timeout);
    Ok(Arc::new(control))
}
