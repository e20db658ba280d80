use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::domain::errors::RepositoryError;

/// API error type with HTTP status code and message
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    /// Creates a new API error
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Creates a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Creates a 404 Not Found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Creates a 500 Internal Server Error
    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

/// Maps the repository taxonomy onto HTTP statuses: validation failures are
/// 400, missing records 404, datastore failures 500
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Validation(message) => Self::bad_request(message),
            RepositoryError::NotFound(message) => Self::not_found(message),
            RepositoryError::Datastore(cause) => {
                tracing::error!("Datastore failure: {}", cause);
                Self::internal_server_error(format!("Datastore error: {}", cause))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_bad_request() {
        let err: ApiError = RepositoryError::Validation("bad input".to_string()).into();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "bad input");
    }

    #[test]
    fn not_found_maps_to_404() {
        let err: ApiError = RepositoryError::NotFound("no such record".to_string()).into();

        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn datastore_maps_to_500() {
        let err: ApiError = RepositoryError::Datastore(sqlx::Error::PoolClosed).into();

        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
