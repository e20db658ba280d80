// HTTP handlers, one module per entity plus the relation-traversal routes

pub mod members;
pub mod relations;
pub mod teams;

use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::domain::query::{Filter, Where};

/// `{count}` body returned by count, bulk-update, and delete operations
#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

/// `{exists}` body returned by existence checks
#[derive(Debug, Serialize)]
pub struct ExistsResponse {
    pub exists: bool,
}

/// `?filter=` query parameter carrying a URL-encoded JSON filter
#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    pub filter: Option<String>,
}

impl FilterQuery {
    pub fn parse(&self) -> Result<Filter, ApiError> {
        match &self.filter {
            Some(raw) => Ok(Filter::from_json(raw)?),
            None => Ok(Filter::default()),
        }
    }
}

/// `?where=` query parameter carrying a URL-encoded JSON where clause
#[derive(Debug, Default, Deserialize)]
pub struct WhereQuery {
    #[serde(rename = "where")]
    pub where_: Option<String>,
}

impl WhereQuery {
    pub fn parse(&self) -> Result<Where, ApiError> {
        match &self.where_ {
            Some(raw) => Ok(Where::from_json(raw)?),
            None => Ok(Where::new()),
        }
    }
}

/// Basic liveness probe
///
/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_filter_parses_to_default() {
        let query = FilterQuery { filter: None };

        let filter = query.parse().unwrap();

        assert!(filter.where_.is_empty());
        assert!(filter.limit.is_none());
    }

    #[test]
    fn malformed_filter_becomes_bad_request() {
        let query = FilterQuery {
            filter: Some("{".to_string()),
        };

        let err = query.parse().unwrap_err();

        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn where_query_parses_json_clause() {
        let query = WhereQuery {
            where_: Some(r#"{"role": "member"}"#.to_string()),
        };

        let where_ = query.parse().unwrap();

        assert_eq!(where_.get("role"), Some(&serde_json::json!("member")));
    }
}
