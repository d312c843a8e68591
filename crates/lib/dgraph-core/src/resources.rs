//! Resource URI resolution.

use dgraph_store::QueryRequest;

use crate::error::{CoreError, CoreResult};
use crate::translate;

pub const SCHEMA_URI: &str = "dgraph://schema";
pub const MOVIE_URI_PREFIX: &str = "movies://";
pub const MOVIE_URI_TEMPLATE: &str = "movies://{id}";

pub const TEXT_PLAIN: &str = "text/plain";
pub const APPLICATION_JSON: &str = "application/json";

/// A fixed resource advertised by `resources/list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    pub uri: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub mime_type: &'static str,
}

/// A parameterised resource advertised by `resources/templates/list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDescriptor {
    pub uri_template: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub mime_type: &'static str,
}

/// A URI matched against the registered resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedResource {
    Schema,
    Movie { id: String },
}

impl ResolvedResource {
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::Schema => TEXT_PLAIN,
            Self::Movie { .. } => APPLICATION_JSON,
        }
    }

    /// Builds the read that backs this resource.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidArgument` if a movie id is not a uid.
    pub fn query_request(&self) -> CoreResult<QueryRequest> {
        match self {
            Self::Schema => Ok(translate::schema_request()),
            Self::Movie { id } => translate::movie_details_request(id),
        }
    }
}

/// Registered resources and templates. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct ResourceResolver {
    resources: Vec<ResourceDescriptor>,
    templates: Vec<TemplateDescriptor>,
}

impl Default for ResourceResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceResolver {
    #[must_use]
    pub fn new() -> Self {
        Self {
            resources: vec![ResourceDescriptor {
                uri: SCHEMA_URI,
                name: "schema",
                description: "Current Dgraph schema and type definitions",
                mime_type: TEXT_PLAIN,
            }],
            templates: vec![TemplateDescriptor {
                uri_template: MOVIE_URI_TEMPLATE,
                name: "movie",
                description: "Details of a movie node by uid",
                mime_type: APPLICATION_JSON,
            }],
        }
    }

    #[must_use]
    pub fn resources(&self) -> &[ResourceDescriptor] {
        &self.resources
    }

    #[must_use]
    pub fn templates(&self) -> &[TemplateDescriptor] {
        &self.templates
    }

    /// Matches `uri` against the registered resources.
    ///
    /// # Errors
    /// Returns `CoreError::NotFound` when nothing matches and
    /// `CoreError::InvalidArgument` when the movie id is empty.
    pub fn resolve(&self, uri: &str) -> CoreResult<ResolvedResource> {
        if self.resources.iter().any(|resource| resource.uri == uri) {
            return Ok(ResolvedResource::Schema);
        }
        if let Some(id) = uri.strip_prefix(MOVIE_URI_PREFIX) {
            if id.is_empty() {
                return Err(CoreError::invalid(format!(
                    "resource uri `{uri}` is missing the movie id"
                )));
            }
            return Ok(ResolvedResource::Movie { id: id.to_string() });
        }
        Err(CoreError::not_found(format!("no resource matches `{uri}`")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_uri_resolves_to_schema_query() {
        let resolved = ResourceResolver::new().resolve(SCHEMA_URI).unwrap();
        assert_eq!(resolved, ResolvedResource::Schema);
        assert_eq!(resolved.mime_type(), TEXT_PLAIN);
        assert_eq!(resolved.query_request().unwrap().query, "schema {}");
    }

    #[test]
    fn movie_uri_extracts_the_id() {
        let resolved = ResourceResolver::new().resolve("movies://0x2a").unwrap();
        assert_eq!(
            resolved,
            ResolvedResource::Movie {
                id: "0x2a".to_string()
            }
        );
        assert_eq!(resolved.mime_type(), APPLICATION_JSON);
        let request = resolved.query_request().unwrap();
        assert_eq!(request.variables.get("$id").map(String::as_str), Some("0x2a"));
    }

    #[test]
    fn unknown_prefix_is_not_found() {
        for uri in ["films://0x1", "dgraph://types", "movies:/0x1", ""] {
            assert!(
                matches!(ResourceResolver::new().resolve(uri), Err(CoreError::NotFound(_))),
                "{uri:?} should not resolve"
            );
        }
    }

    #[test]
    fn empty_movie_id_is_invalid() {
        assert!(matches!(
            ResourceResolver::new().resolve("movies://"),
            Err(CoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn listings_expose_one_resource_and_one_template() {
        let resolver = ResourceResolver::new();
        assert_eq!(resolver.resources().len(), 1);
        assert_eq!(resolver.templates()[0].uri_template, MOVIE_URI_TEMPLATE);
    }
}
