use std::borrow::Cow;

use dgraph_core::CoreError;
use rmcp::ErrorData;
use rmcp::model::{CallToolResult, Content, ErrorCode};

pub(crate) fn mcp_err(code: ErrorCode, message: impl Into<Cow<'static, str>>) -> ErrorData {
    ErrorData {
        code,
        message: message.into(),
        data: None,
    }
}

/// Maps a tool failure onto the MCP envelope.
///
/// Lookup and validation failures are protocol errors. Execution failures
/// are reported in-band so the client sees the backend's message.
pub(crate) fn tool_failure(err: CoreError) -> Result<CallToolResult, ErrorData> {
    match err {
        CoreError::NotFound(message) => Err(mcp_err(ErrorCode::METHOD_NOT_FOUND, message)),
        CoreError::InvalidArgument(message) => Err(mcp_err(ErrorCode::INVALID_PARAMS, message)),
        err @ (CoreError::Backend(_) | CoreError::Cancelled(_)) => {
            Ok(CallToolResult::error(vec![Content::text(err.to_string())]))
        }
    }
}

pub(crate) fn resource_failure(err: CoreError) -> ErrorData {
    match err {
        CoreError::NotFound(message) => mcp_err(ErrorCode::RESOURCE_NOT_FOUND, message),
        CoreError::InvalidArgument(message) => mcp_err(ErrorCode::INVALID_PARAMS, message),
        err @ (CoreError::Backend(_) | CoreError::Cancelled(_)) => {
            mcp_err(ErrorCode::INTERNAL_ERROR, err.to_string())
        }
    }
}
