use thiserror::Error;

/// Errors surfaced by the repository layer
///
/// Maps onto the API error taxonomy: validation failures are client errors,
/// missing records are 404s, and datastore failures pass through unchanged
/// with no retry.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Datastore error: {0}")]
    Datastore(#[from] sqlx::Error),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;
