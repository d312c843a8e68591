use serde_json::{Map, Value};

/// Raw argument mapping of an invocation.
pub type Arguments = Map<String, Value>;

/// One inbound tool call. Immutable for the duration of its handling.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub name: String,
    pub arguments: Arguments,
}

impl ToolInvocation {
    pub fn new(name: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// Text payload returned by a tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub text: String,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Contents returned for a resource read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceOutput {
    pub uri: String,
    pub mime_type: &'static str,
    pub text: String,
}
