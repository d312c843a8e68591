//! Builds backend requests from validated tool arguments.
//!
//! Caller-supplied queries, mutations and schema text are passed through
//! untouched. The only text this module generates is the movie search query
//! and the lookup queries behind resources.

use dgraph_store::{MutationRequest, QueryRequest, SchemaOperation};
use rmcp::schemars::{self, JsonSchema};

use crate::args::{AlterSchemaParams, MutateParams, QueryParams};
use crate::error::{CoreError, CoreResult};

/// Query that returns the current schema and type definitions.
pub const SCHEMA_QUERY: &str = "schema {}";

#[must_use]
pub fn query_request(params: QueryParams) -> QueryRequest {
    QueryRequest::new(params.query).with_variables(params.variables)
}

#[must_use]
pub fn mutation_request(params: MutateParams) -> MutationRequest {
    MutationRequest::new(params.mutation).with_commit_now(params.commit)
}

#[must_use]
pub fn schema_operation(params: AlterSchemaParams) -> SchemaOperation {
    SchemaOperation::new(params.schema)
}

#[must_use]
pub fn schema_request() -> QueryRequest {
    QueryRequest::new(SCHEMA_QUERY)
}

/// Field the movie search matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, JsonSchema)]
#[schemars(rename_all = "lowercase")]
pub enum SearchType {
    Title,
    Actor,
    Director,
    Genre,
    #[default]
    Any,
}

impl SearchType {
    #[cfg(test)]
    const ALL: [Self; 5] = [
        Self::Title,
        Self::Actor,
        Self::Director,
        Self::Genre,
        Self::Any,
    ];

    /// Parses a selector. Anything unrecognized searches every field.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "title" => Self::Title,
            "actor" => Self::Actor,
            "director" => Self::Director,
            "genre" => Self::Genre,
            _ => Self::Any,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Actor => "actor",
            Self::Director => "director",
            Self::Genre => "genre",
            Self::Any => "any",
        }
    }

    /// Renders the fixed query shape for this selector around an already
    /// escaped DQL string literal.
    fn render(self, literal: &str) -> String {
        let (root, extra_field) = match self {
            Self::Title => (format!("alloftext(title, {literal})"), None),
            Self::Actor => (format!("allofterms(actors, {literal})"), Some("actors")),
            Self::Director => (format!("allofterms(director, {literal})"), None),
            Self::Genre => (format!("allofterms(genres, {literal})"), Some("genres")),
            Self::Any => (
                format!(
                    "has(title)) @filter(anyoftext(title, {literal}) OR anyofterms(director, {literal}) OR anyofterms(actors, {literal}) OR anyofterms(genres, {literal})"
                ),
                None,
            ),
        };
        let extra = extra_field.map_or_else(String::new, |field| format!("    {field}\n"));
        format!(
            "{{\n  movies(func: {root}) {{\n    uid\n    title\n    release_year\n    director\n{extra}    rating\n  }}\n}}"
        )
    }
}

/// Builds the derived movie search query.
///
/// # Errors
/// Returns `CoreError::InvalidArgument` for a blank term or one containing
/// control characters that cannot appear in a DQL string literal.
pub fn search_request(term: &str, search_type: SearchType) -> CoreResult<QueryRequest> {
    if term.trim().is_empty() {
        return Err(CoreError::invalid("search_term must not be blank"));
    }
    let literal = dql_string_literal(term)?;
    Ok(QueryRequest::new(search_type.render(&literal)))
}

/// Quotes `value` as a DQL string literal.
///
/// # Errors
/// Returns `CoreError::InvalidArgument` for control characters other than
/// newline, carriage return and tab.
pub fn dql_string_literal(value: &str) -> CoreResult<String> {
    let mut literal = String::with_capacity(value.len() + 2);
    literal.push('"');
    for ch in value.chars() {
        match ch {
            '"' => literal.push_str("\\\""),
            '\\' => literal.push_str("\\\\"),
            '\n' => literal.push_str("\\n"),
            '\r' => literal.push_str("\\r"),
            '\t' => literal.push_str("\\t"),
            ch if ch.is_control() => {
                return Err(CoreError::invalid(format!(
                    "search_term contains unsupported control character U+{:04X}",
                    u32::from(ch)
                )));
            }
            ch => literal.push(ch),
        }
    }
    literal.push('"');
    Ok(literal)
}

/// Builds the movie details lookup for a uid taken from a resource URI.
///
/// # Errors
/// Returns `CoreError::InvalidArgument` if `id` is empty or not a uid literal.
pub fn movie_details_request(id: &str) -> CoreResult<QueryRequest> {
    if id.is_empty() {
        return Err(CoreError::invalid("movie id must not be empty"));
    }
    if !is_uid_literal(id) {
        return Err(CoreError::invalid(format!(
            "movie id `{id}` is not a uid (expected 0x-prefixed hex or decimal)"
        )));
    }
    let query = "query movie($id: string) {\n  movie(func: uid($id)) {\n    uid\n    title\n    release_year\n    director\n    actors\n    genres\n    rating\n    description\n  }\n}";
    Ok(QueryRequest::new(query).with_variable("$id", id))
}

fn is_uid_literal(id: &str) -> bool {
    if let Some(hex) = id.strip_prefix("0x").or_else(|| id.strip_prefix("0X")) {
        !hex.is_empty() && hex.chars().all(|ch| ch.is_ascii_hexdigit())
    } else {
        id.chars().all(|ch| ch.is_ascii_digit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn director_search_substitutes_term_verbatim() {
        let request = search_request("Nolan", SearchType::Director).unwrap();
        assert!(request.query.contains(r#"allofterms(director, "Nolan")"#));
        assert!(request.variables.is_empty());
    }

    #[test]
    fn every_selector_has_its_own_shape() {
        let expected = [
            (SearchType::Title, r#"alloftext(title, "Heat")"#),
            (SearchType::Actor, r#"allofterms(actors, "Heat")"#),
            (SearchType::Director, r#"allofterms(director, "Heat")"#),
            (SearchType::Genre, r#"allofterms(genres, "Heat")"#),
            (SearchType::Any, r#"anyoftext(title, "Heat")"#),
        ];
        for (search_type, fragment) in expected {
            let request = search_request("Heat", search_type).unwrap();
            assert!(
                request.query.contains(fragment),
                "{} query should contain {fragment}: {}",
                search_type.as_str(),
                request.query
            );
        }
    }

    #[test]
    fn extra_fields_follow_the_selector() {
        let actor = search_request("Bale", SearchType::Actor).unwrap();
        assert!(actor.query.contains("    actors\n"));
        let genre = search_request("Crime", SearchType::Genre).unwrap();
        assert!(genre.query.contains("    genres\n"));
        let title = search_request("Heat", SearchType::Title).unwrap();
        assert!(!title.query.contains("actors"));
    }

    #[test]
    fn unrecognized_selector_uses_any_template() {
        let fallback = search_request("Nolan", SearchType::parse("composer")).unwrap();
        let any = search_request("Nolan", SearchType::Any).unwrap();
        assert_eq!(fallback, any);
    }

    #[test]
    fn selectors_round_trip_through_parse() {
        for search_type in SearchType::ALL {
            assert_eq!(SearchType::parse(search_type.as_str()), search_type);
        }
    }

    #[test]
    fn string_delimiters_are_escaped() {
        let request = search_request(r#"Nolan") { uid } }"#, SearchType::Director).unwrap();
        assert!(request
            .query
            .contains(r#"allofterms(director, "Nolan\") { uid } }")"#));
        let literal = dql_string_literal("a\\b\nc").unwrap();
        assert_eq!(literal, r#""a\\b\nc""#);
    }

    #[test]
    fn blank_and_control_terms_are_rejected() {
        assert!(matches!(
            search_request("   ", SearchType::Any),
            Err(CoreError::InvalidArgument(_))
        ));
        assert!(matches!(
            search_request("bell\u{7}", SearchType::Title),
            Err(CoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn movie_lookup_binds_the_uid() {
        let request = movie_details_request("0x2a").unwrap();
        assert!(request.query.contains("uid($id)"));
        assert_eq!(request.variables.get("$id").map(String::as_str), Some("0x2a"));
        assert!(movie_details_request("42").is_ok());
    }

    #[test]
    fn movie_lookup_rejects_malformed_ids() {
        for id in ["", "0x", "0xZZ", "abc", "1) { uid }"] {
            assert!(
                matches!(movie_details_request(id), Err(CoreError::InvalidArgument(_))),
                "{id:?} should be rejected"
            );
        }
    }

    #[test]
    fn passthrough_requests_are_unmodified() {
        let query = query_request(QueryParams {
            query: "{ q(func: has(name)) { name } }".to_string(),
            variables: std::collections::BTreeMap::new(),
        });
        assert_eq!(query.query, "{ q(func: has(name)) { name } }");

        let mutation = mutation_request(MutateParams {
            mutation: "_:a <name> \"A\" .".to_string(),
            commit: false,
        });
        assert_eq!(mutation.set_nquads, "_:a <name> \"A\" .");
        assert!(!mutation.commit_now);

        let schema = schema_operation(AlterSchemaParams {
            schema: "name: string @index(exact) .".to_string(),
        });
        assert_eq!(schema.schema, "name: string @index(exact) .");
        assert_eq!(schema_request().query, SCHEMA_QUERY);
    }
}
