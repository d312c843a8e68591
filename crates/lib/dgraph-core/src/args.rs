//! Argument validation for tool invocations.
//!
//! Each tool declares a parameter struct that doubles as its input schema.
//! Required fields must be present with the declared JSON type; optional
//! fields fall back to their documented default when absent or `null`.
//! Unknown keys are ignored.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use rmcp::schemars::{self, JsonSchema};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::{CoreError, CoreResult};
use crate::invocation::Arguments;
use crate::translate::SearchType;

/// Parameters extracted from a raw argument map.
pub trait ToolParams: DeserializeOwned {
    /// Validates and extracts the parameters.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidArgument` when a required field is missing
    /// or any declared field has the wrong type.
    fn from_arguments(args: &Arguments) -> CoreResult<Self> {
        serde_json::from_value(Value::Object(args.clone()))
            .map_err(|err| CoreError::invalid(format!("invalid arguments: {err}")))
    }
}

/// Parameters for the read query tool.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, JsonSchema)]
pub struct QueryParams {
    /// DQL query text.
    pub query: String,
    /// Query variables. Names may omit the leading `$`.
    #[serde(default, deserialize_with = "variables")]
    #[schemars(schema_with = "variables_schema")]
    pub variables: BTreeMap<String, String>,
}

impl ToolParams for QueryParams {}

/// Parameters for the mutation tool.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, JsonSchema)]
pub struct MutateParams {
    /// N-Quad statements to set.
    pub mutation: String,
    /// Commit immediately. When false the mutation is discarded.
    #[serde(default = "commit_by_default", deserialize_with = "commit")]
    pub commit: bool,
}

impl ToolParams for MutateParams {}

/// Parameters for the schema alteration tool.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, JsonSchema)]
pub struct AlterSchemaParams {
    /// Schema definition text.
    pub schema: String,
}

impl ToolParams for AlterSchemaParams {}

/// Parameters for the movie search tool.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, JsonSchema)]
pub struct SearchMoviesParams {
    /// Text to search for.
    pub search_term: String,
    /// Field to match. Unrecognized selectors search every field.
    #[serde(default, deserialize_with = "search_type")]
    pub search_type: SearchType,
}

impl ToolParams for SearchMoviesParams {}

/// The health tool takes no arguments.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, JsonSchema)]
pub struct HealthParams {}

impl ToolParams for HealthParams {}

const fn commit_by_default() -> bool {
    true
}

fn commit<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or_else(commit_by_default))
}

fn search_type<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SearchType, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?
        .as_deref()
        .map_or(SearchType::Any, SearchType::parse))
}

fn variables<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, String>, D::Error> {
    Option::<Map<String, Value>>::deserialize(deserializer)?
        .map_or_else(|| Ok(BTreeMap::new()), |raw| normalize_variables(&raw))
        .map_err(D::Error::custom)
}

fn variables_schema(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
    schemars::json_schema!({
        "type": "object",
        "additionalProperties": { "type": ["string", "number", "boolean"] },
    })
}

/// Dgraph binds variables as strings keyed by `$name`.
fn normalize_variables(raw: &Map<String, Value>) -> Result<BTreeMap<String, String>, String> {
    let mut bound = BTreeMap::new();
    for (name, value) in raw {
        let value = match value {
            Value::String(text) => text.clone(),
            Value::Number(number) => number.to_string(),
            Value::Bool(flag) => flag.to_string(),
            _ => {
                return Err(format!(
                    "variable `{name}` must be a string, number or boolean"
                ));
            }
        };
        let name = if name.starts_with('$') {
            name.clone()
        } else {
            format!("${name}")
        };
        match bound.entry(name) {
            Entry::Occupied(entry) => {
                return Err(format!("variable `{}` is bound more than once", entry.key()));
            }
            Entry::Vacant(entry) => {
                entry.insert(value);
            }
        }
    }
    Ok(bound)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn args(value: Value) -> Arguments {
        match value {
            Value::Object(map) => map,
            other => panic!("test arguments must be an object, got {other}"),
        }
    }

    #[test]
    fn missing_required_string_is_invalid() {
        let err = QueryParams::from_arguments(&args(json!({}))).unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(message) if message.contains("query")));
    }

    #[test]
    fn mistyped_required_string_is_invalid() {
        let err = AlterSchemaParams::from_arguments(&args(json!({ "schema": 42 }))).unwrap_err();
        assert!(
            matches!(err, CoreError::InvalidArgument(message) if message.contains("expected a string"))
        );
    }

    #[test]
    fn null_required_field_counts_as_missing() {
        let err = MutateParams::from_arguments(&args(json!({ "mutation": null }))).unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
    }

    #[test]
    fn commit_defaults_to_true() {
        let params =
            MutateParams::from_arguments(&args(json!({ "mutation": "_:a <name> \"A\" ." })))
                .unwrap();
        assert!(params.commit);

        let params = MutateParams::from_arguments(&args(
            json!({ "mutation": "_:a <name> \"A\" .", "commit": null }),
        ))
        .unwrap();
        assert!(params.commit);
    }

    #[test]
    fn mistyped_commit_is_invalid() {
        let err = MutateParams::from_arguments(&args(
            json!({ "mutation": "_:a <name> \"A\" .", "commit": "yes" }),
        ))
        .unwrap_err();
        assert!(
            matches!(err, CoreError::InvalidArgument(message) if message.contains("expected a boolean"))
        );
    }

    #[test]
    fn unknown_fields_pass_through() {
        let params = AlterSchemaParams::from_arguments(&args(
            json!({ "schema": "name: string .", "dry_run": true }),
        ))
        .unwrap();
        assert_eq!(params.schema, "name: string .");
    }

    #[test]
    fn search_type_defaults_to_any() {
        let params =
            SearchMoviesParams::from_arguments(&args(json!({ "search_term": "Nolan" }))).unwrap();
        assert_eq!(params.search_type, SearchType::Any);

        let params = SearchMoviesParams::from_arguments(&args(
            json!({ "search_term": "Nolan", "search_type": "composer" }),
        ))
        .unwrap();
        assert_eq!(params.search_type, SearchType::Any);
    }

    #[test]
    fn variables_are_stringified_and_prefixed() {
        let params = QueryParams::from_arguments(&args(json!({
            "query": "query q($name: string, $limit: int) { q(func: eq(name, $name), first: $limit) { uid } }",
            "variables": { "name": "Alice", "$limit": 3, "exact": false },
        })))
        .unwrap();
        assert_eq!(params.variables.get("$name").map(String::as_str), Some("Alice"));
        assert_eq!(params.variables.get("$limit").map(String::as_str), Some("3"));
        assert_eq!(params.variables.get("$exact").map(String::as_str), Some("false"));
    }

    #[test]
    fn nested_variable_values_are_rejected() {
        let err = QueryParams::from_arguments(&args(json!({
            "query": "{ q(func: has(name)) { name } }",
            "variables": { "filter": { "name": "Alice" } },
        })))
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(message) if message.contains("filter")));
    }

    #[test]
    fn variables_must_be_an_object() {
        let err = QueryParams::from_arguments(&args(json!({
            "query": "{ q(func: has(name)) { name } }",
            "variables": ["a"],
        })))
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(message) if message.contains("sequence")));
    }

    #[test]
    fn duplicate_variable_names_are_rejected() {
        let err = QueryParams::from_arguments(&args(json!({
            "query": "query q($name: string) { q(func: eq(name, $name)) { uid } }",
            "variables": { "name": "Alice", "$name": "Bob" },
        })))
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(message) if message.contains("$name")));
    }

    #[test]
    fn null_variables_bind_nothing() {
        let params = QueryParams::from_arguments(&args(json!({
            "query": "{ q(func: has(name)) { name } }",
            "variables": null,
        })))
        .unwrap();
        assert!(params.variables.is_empty());
    }

    #[test]
    fn health_accepts_any_arguments() {
        assert_eq!(
            HealthParams::from_arguments(&args(json!({ "verbose": true }))).unwrap(),
            HealthParams {}
        );
    }
}
