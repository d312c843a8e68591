//! Sample movie dataset used by `search_movies` and `movies://{id}`.

use dgraph_store::{
    BackendError,
    GraphBackend,
    GraphTxn,
    MutationRequest,
    QueryRequest,
    SchemaOperation,
    TxnMode,
};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::control::DgraphControlPlane;
use crate::error::CoreResult;

pub const MOVIE_SCHEMA: &str = r"title: string @index(fulltext) .
release_year: int @index(int) .
director: string @index(term) .
actors: [string] @index(term) .
genres: [string] @index(term) .
rating: float .
description: string .

type Movie {
  title
  release_year
  director
  actors
  genres
  rating
  description
}
";

pub const MOVIE_COUNT_QUERY: &str = "{ movies(func: has(title)) { count(uid) } }";

pub const SAMPLE_MOVIES: &str = r#"_:inception <title> "Inception" .
_:inception <release_year> "2010" .
_:inception <director> "Christopher Nolan" .
_:inception <actors> "Leonardo DiCaprio" .
_:inception <actors> "Joseph Gordon-Levitt" .
_:inception <actors> "Ellen Page" .
_:inception <genres> "Sci-Fi" .
_:inception <genres> "Action" .
_:inception <rating> "8.8" .
_:inception <description> "A thief who steals corporate secrets through the use of dream-sharing technology is given the inverse task of planting an idea into the mind of a C.E.O." .
_:inception <dgraph.type> "Movie" .
_:darkKnight <title> "The Dark Knight" .
_:darkKnight <release_year> "2008" .
_:darkKnight <director> "Christopher Nolan" .
_:darkKnight <actors> "Christian Bale" .
_:darkKnight <actors> "Heath Ledger" .
_:darkKnight <actors> "Aaron Eckhart" .
_:darkKnight <genres> "Action" .
_:darkKnight <genres> "Crime" .
_:darkKnight <genres> "Drama" .
_:darkKnight <rating> "9.0" .
_:darkKnight <description> "When the menace known as the Joker wreaks havoc and chaos on the people of Gotham, Batman must accept one of the greatest psychological and physical tests of his ability to fight injustice." .
_:darkKnight <dgraph.type> "Movie" .
_:pulpFiction <title> "Pulp Fiction" .
_:pulpFiction <release_year> "1994" .
_:pulpFiction <director> "Quentin Tarantino" .
_:pulpFiction <actors> "John Travolta" .
_:pulpFiction <actors> "Uma Thurman" .
_:pulpFiction <actors> "Samuel L. Jackson" .
_:pulpFiction <genres> "Crime" .
_:pulpFiction <genres> "Drama" .
_:pulpFiction <rating> "8.9" .
_:pulpFiction <description> "The lives of two mob hitmen, a boxer, a gangster and his wife, and a pair of diner bandits intertwine in four tales of violence and redemption." .
_:pulpFiction <dgraph.type> "Movie" .
"#;

/// What [`DgraphControlPlane::seed_movies`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// Sample movies were inserted.
    Inserted,
    /// Movies already existed; only the schema was applied.
    AlreadyPresent { count: u64 },
}

impl<B: GraphBackend> DgraphControlPlane<B> {
    /// Applies the movie schema and inserts the sample movies into an empty
    /// database.
    ///
    /// # Errors
    /// Returns `CoreError` if any backend call fails, is cancelled, or the
    /// count query returns an unexpected document.
    pub async fn seed_movies(&self, cancel: &CancellationToken) -> CoreResult<SeedOutcome> {
        let backend = self.coordinator().backend().clone();
        let schema = SchemaOperation::new(MOVIE_SCHEMA);
        self.coordinator()
            .run(cancel, async move { backend.alter(&schema).await })
            .await?;
        info!("movie schema applied");

        let count_request = QueryRequest::new(MOVIE_COUNT_QUERY);
        let count = self
            .coordinator()
            .with_transaction(TxnMode::ReadOnly, cancel, move |txn| {
                Box::pin(async move {
                    let response = txn.query(&count_request).await?;
                    movie_count(&response.json)
                })
            })
            .await?;
        if count > 0 {
            info!(count, "movie data already present; skipping sample insert");
            return Ok(SeedOutcome::AlreadyPresent { count });
        }

        let insert = MutationRequest::new(SAMPLE_MOVIES);
        self.coordinator()
            .with_transaction(TxnMode::ReadWrite, cancel, move |txn| {
                Box::pin(async move { txn.mutate(&insert).await })
            })
            .await?;
        info!("sample movies inserted");
        Ok(SeedOutcome::Inserted)
    }
}

/// Reads `movies[0].count` from the count query result. A missing entry
/// means zero.
fn movie_count(json: &str) -> Result<u64, BackendError> {
    let document: Value =
        serde_json::from_str(json).map_err(|err| BackendError::Decode(err.to_string()))?;
    match document.pointer("/movies/0/count") {
        None => Ok(0),
        Some(count) => count
            .as_u64()
            .ok_or_else(|| BackendError::Decode(format!("movie count is not an integer: {count}"))),
    }
}
