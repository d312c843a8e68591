//! Tool declarations keyed by name.

use std::collections::HashMap;
use std::sync::Arc;

use rmcp::handler::server::tool::schema_for_type;
use rmcp::model::JsonObject;

use crate::args::{AlterSchemaParams, HealthParams, MutateParams, QueryParams, SearchMoviesParams};
use crate::error::{CoreError, CoreResult};

pub const QUERY_TOOL: &str = "dgraph_query";
pub const MUTATE_TOOL: &str = "dgraph_mutate";
pub const ALTER_SCHEMA_TOOL: &str = "dgraph_alter_schema";
pub const SEARCH_MOVIES_TOOL: &str = "search_movies";
pub const HEALTH_TOOL: &str = "health";

/// Which handler a declared tool routes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Query,
    Mutate,
    AlterSchema,
    SearchMovies,
    Health,
}

/// Name, description and JSON input schema of one tool. The schema is
/// derived from the tool's parameter struct.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDeclaration {
    pub kind: ToolKind,
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Arc<JsonObject>,
}

impl ToolDeclaration {
    const fn new(
        kind: ToolKind,
        name: &'static str,
        description: &'static str,
        input_schema: Arc<JsonObject>,
    ) -> Self {
        Self {
            kind,
            name,
            description,
            input_schema,
        }
    }
}

/// Exact-match lookup from tool name to declaration.
#[derive(Debug, Clone)]
pub struct DispatchTable {
    by_name: HashMap<&'static str, usize>,
    declarations: Vec<ToolDeclaration>,
}

impl Default for DispatchTable {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchTable {
    #[must_use]
    pub fn new() -> Self {
        let declarations = vec![
            ToolDeclaration::new(
                ToolKind::Query,
                QUERY_TOOL,
                "Execute a read-only DQL query against Dgraph and return the JSON result.",
                schema_for_type::<QueryParams>(),
            ),
            ToolDeclaration::new(
                ToolKind::Mutate,
                MUTATE_TOOL,
                "Apply an RDF N-Quads set mutation to Dgraph.",
                schema_for_type::<MutateParams>(),
            ),
            ToolDeclaration::new(
                ToolKind::AlterSchema,
                ALTER_SCHEMA_TOOL,
                "Alter the Dgraph schema. Applies immediately and cannot be rolled back.",
                schema_for_type::<AlterSchemaParams>(),
            ),
            ToolDeclaration::new(
                ToolKind::SearchMovies,
                SEARCH_MOVIES_TOOL,
                "Search the movie dataset by title, actor, director or genre.",
                schema_for_type::<SearchMoviesParams>(),
            ),
            ToolDeclaration::new(
                ToolKind::Health,
                HEALTH_TOOL,
                "Health check for the MCP server.",
                schema_for_type::<HealthParams>(),
            ),
        ];
        let by_name = declarations
            .iter()
            .enumerate()
            .map(|(index, declaration)| (declaration.name, index))
            .collect();
        Self {
            by_name,
            declarations,
        }
    }

    /// Declarations in registration order.
    #[must_use]
    pub fn declarations(&self) -> &[ToolDeclaration] {
        &self.declarations
    }

    /// # Errors
    /// Returns `CoreError::NotFound` for an unregistered name.
    pub fn lookup(&self, name: &str) -> CoreResult<&ToolDeclaration> {
        self.by_name
            .get(name)
            .and_then(|index| self.declarations.get(*index))
            .ok_or_else(|| CoreError::not_found(format!("unknown tool `{name}`")))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn every_tool_is_registered_once() {
        let table = DispatchTable::new();
        let names: Vec<_> = table.declarations().iter().map(|tool| tool.name).collect();
        assert_eq!(
            names,
            [QUERY_TOOL, MUTATE_TOOL, ALTER_SCHEMA_TOOL, SEARCH_MOVIES_TOOL, HEALTH_TOOL]
        );
        for name in names {
            assert_eq!(table.lookup(name).unwrap().name, name);
        }
    }

    #[test]
    fn lookup_is_exact_match() {
        let table = DispatchTable::new();
        for name in ["DGRAPH_QUERY", "dgraph_query ", "dgraph", ""] {
            assert!(matches!(table.lookup(name), Err(CoreError::NotFound(_))));
        }
    }

    #[test]
    fn schemas_list_required_fields() {
        let table = DispatchTable::new();
        let required = |name: &str| {
            table.lookup(name).unwrap().input_schema.get("required").cloned()
        };
        assert_eq!(required(QUERY_TOOL), Some(json!(["query"])));
        assert_eq!(required(MUTATE_TOOL), Some(json!(["mutation"])));
        assert_eq!(required(SEARCH_MOVIES_TOOL), Some(json!(["search_term"])));
        assert_eq!(required(ALTER_SCHEMA_TOOL), Some(json!(["schema"])));
        assert_eq!(required(HEALTH_TOOL), None);
    }

    #[test]
    fn schemas_describe_defaults_and_selectors() {
        let table = DispatchTable::new();
        let mutate = &table.lookup(MUTATE_TOOL).unwrap().input_schema;
        assert_eq!(mutate["properties"]["commit"]["default"], json!(true));

        let search = table.lookup(SEARCH_MOVIES_TOOL).unwrap().input_schema.clone();
        let selectors = serde_json::to_string(&*search).unwrap();
        for selector in ["title", "actor", "director", "genre", "any"] {
            assert!(selectors.contains(&format!("\"{selector}\"")), "{selector} missing");
        }

        let query = &table.lookup(QUERY_TOOL).unwrap().input_schema;
        assert_eq!(query["properties"]["variables"]["type"], json!("object"));
        for schema in table.declarations().iter().map(|tool| &tool.input_schema) {
            assert_eq!(schema["type"], json!("object"));
        }
    }
}
