//! MCP server implementation for dgraph-mcp.
//!
//! This crate exposes the control plane's tool dispatch table and resource
//! resolver through an rmcp `ServerHandler`, and maps core errors onto MCP
//! error codes.

mod helpers;
pub mod server;

use std::sync::Arc;

use dgraph_core::dispatch::ToolDeclaration;
use dgraph_core::resources::{ResourceDescriptor, TemplateDescriptor};
use dgraph_core::{DgraphControlPlane, ToolInvocation};
use dgraph_store::GraphBackend;
use rmcp::model::{
    CallToolRequestParams,
    CallToolResult,
    Content,
    ErrorCode,
    JsonObject,
    ListResourceTemplatesResult,
    ListResourcesResult,
    ListToolsResult,
    PaginatedRequestParams,
    RawResource,
    ReadResourceRequestParams,
    ReadResourceResult,
    Resource,
    ResourceContents,
    ResourceTemplate,
    ServerCapabilities,
    ServerInfo,
    Tool,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData, RoleServer, ServerHandler};
use tokio_util::sync::CancellationToken;

use crate::helpers::{mcp_err, resource_failure, tool_failure};

const SERVER_INSTRUCTIONS: &str = r"dgraph-mcp exposes a Dgraph graph database over MCP.

Tools:
- `dgraph_query` runs a read-only DQL query. Pass `variables` as an object; names may omit the `$`.
- `dgraph_mutate` applies RDF N-Quads. `commit` defaults to true; with `commit: false` the
  mutation is discarded when the call returns.
- `dgraph_alter_schema` alters the schema. Alterations apply immediately and cannot be rolled back.
- `search_movies` searches the movie dataset by `title`, `actor`, `director`, `genre` or `any`.
- `health` returns `ok`.

Resources:
- `dgraph://schema` returns the current schema and type definitions.
- `movies://{id}` returns a movie by uid (for example `movies://0x2a`).";

/// MCP server wrapper around a shared control plane.
pub struct DgraphMcp<B: GraphBackend> {
    control: Arc<DgraphControlPlane<B>>,
}

impl<B: GraphBackend> Clone for DgraphMcp<B> {
    fn clone(&self) -> Self {
        Self {
            control: self.control.clone(),
        }
    }
}

impl<B: GraphBackend> DgraphMcp<B> {
    /// Creates a new server using a control plane by value.
    #[must_use]
    pub fn new(control: DgraphControlPlane<B>) -> Self {
        Self::with_control(Arc::new(control))
    }

    /// Creates a new server using a shared control plane handle.
    #[must_use]
    pub const fn with_control(control: Arc<DgraphControlPlane<B>>) -> Self {
        Self { control }
    }

    #[must_use]
    pub fn control(&self) -> &DgraphControlPlane<B> {
        &self.control
    }

    #[must_use]
    pub fn list_tools_impl(&self) -> ListToolsResult {
        ListToolsResult::with_all_items(
            self.control
                .tools()
                .declarations()
                .iter()
                .map(tool_from_declaration)
                .collect(),
        )
    }

    #[must_use]
    pub fn list_resources_impl(&self) -> ListResourcesResult {
        ListResourcesResult::with_all_items(
            self.control
                .resources()
                .resources()
                .iter()
                .map(resource_from_descriptor)
                .collect(),
        )
    }

    /// # Errors
    /// Returns `INTERNAL_ERROR` if a template descriptor cannot be encoded.
    pub fn list_resource_templates_impl(&self) -> Result<ListResourceTemplatesResult, ErrorData> {
        let templates = self
            .control
            .resources()
            .templates()
            .iter()
            .map(template_from_descriptor)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ListResourceTemplatesResult::with_all_items(templates))
    }

    /// Runs a tool call against the control plane.
    ///
    /// # Errors
    /// Returns `METHOD_NOT_FOUND` for unknown tools and `INVALID_PARAMS` for
    /// invalid arguments. Backend failures come back as an error result.
    pub async fn call_tool_impl(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
        cancel: &CancellationToken,
    ) -> Result<CallToolResult, ErrorData> {
        let invocation = ToolInvocation::new(name, arguments.unwrap_or_default());
        match self.control.invoke(&invocation, cancel).await {
            Ok(output) => Ok(CallToolResult::success(vec![Content::text(output.text)])),
            Err(err) => tool_failure(err),
        }
    }

    /// Reads a resource by URI.
    ///
    /// # Errors
    /// Returns `RESOURCE_NOT_FOUND` for unknown URIs, `INVALID_PARAMS` for a
    /// malformed movie id and `INTERNAL_ERROR` when the read fails.
    pub async fn read_resource_impl(
        &self,
        uri: &str,
        cancel: &CancellationToken,
    ) -> Result<ReadResourceResult, ErrorData> {
        let output = self
            .control
            .read_resource(uri, cancel)
            .await
            .map_err(resource_failure)?;
        let mut contents = ResourceContents::text(output.text, output.uri);
        if let ResourceContents::TextResourceContents { mime_type, .. } = &mut contents {
            *mime_type = Some(output.mime_type.to_string());
        }
        Ok(ReadResourceResult {
            contents: vec![contents],
        })
    }
}

fn tool_from_declaration(declaration: &ToolDeclaration) -> Tool {
    Tool::new(
        declaration.name,
        declaration.description,
        declaration.input_schema.clone(),
    )
}

fn resource_from_descriptor(descriptor: &ResourceDescriptor) -> Resource {
    let mut raw = RawResource::new(descriptor.uri, descriptor.name);
    raw.description = Some(descriptor.description.to_string());
    raw.mime_type = Some(descriptor.mime_type.to_string());
    Resource::new(raw, None)
}

fn template_from_descriptor(descriptor: &TemplateDescriptor) -> Result<ResourceTemplate, ErrorData> {
    serde_json::from_value(serde_json::json!({
        "uriTemplate": descriptor.uri_template,
        "name": descriptor.name,
        "description": descriptor.description,
        "mimeType": descriptor.mime_type,
    }))
    .map_err(|err| {
        mcp_err(
            ErrorCode::INTERNAL_ERROR,
            format!("invalid resource template `{}`: {err}", descriptor.uri_template),
        )
    })
}

impl<B: GraphBackend> ServerHandler for DgraphMcp<B> {
    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.call_tool_impl(&request.name, request.arguments, &context.ct)
            .await
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(self.list_tools_impl())
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, ErrorData> {
        Ok(self.list_resources_impl())
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, ErrorData> {
        self.list_resource_templates_impl()
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, ErrorData> {
        self.read_resource_impl(&request.uri, &context.ct).await
    }

    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            ..Default::default()
        }
    }
}
