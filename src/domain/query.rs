use serde::Deserialize;
use serde_json::{Map, Value};

use crate::domain::errors::{RepositoryError, RepositoryResult};

/// LoopBack-style query filter
///
/// Arrives URL-encoded as a JSON object in the `filter` query parameter:
/// `{"where": {...}, "order": "name ASC", "limit": 10, "skip": 5}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Filter {
    #[serde(default, rename = "where")]
    pub where_: Where,
    #[serde(default)]
    pub order: Option<Order>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub skip: Option<i64>,
}

impl Filter {
    /// Parses a filter from its raw JSON query-parameter value
    pub fn from_json(raw: &str) -> RepositoryResult<Self> {
        serde_json::from_str(raw)
            .map_err(|e| RepositoryError::Validation(format!("Malformed filter: {}", e)))
    }

    /// Builds a filter that only constrains the where clause
    pub fn with_where(where_: Where) -> Self {
        Self {
            where_,
            ..Self::default()
        }
    }
}

/// Equality-only where clause over entity fields
///
/// `null` values match `IS NULL`. Nested objects (LoopBack operator syntax
/// such as `{"gt": 5}`) are rejected by the repositories rather than
/// silently ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Where(Map<String, Value>);

impl Where {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a where clause from its raw JSON query-parameter value
    pub fn from_json(raw: &str) -> RepositoryResult<Self> {
        serde_json::from_str(raw)
            .map_err(|e| RepositoryError::Validation(format!("Malformed where clause: {}", e)))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Sets an equality condition, replacing any existing one for the field
    pub fn set(&mut self, field: &str, value: Value) {
        self.0.insert(field.to_string(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

/// Sort directive: a single `"column ASC|DESC"` clause or an array of them
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Order {
    One(String),
    Many(Vec<String>),
}

/// A validated order clause ready for SQL rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderClause {
    pub column: String,
    pub descending: bool,
}

impl Order {
    /// Parses the directive against an entity's column whitelist
    ///
    /// Direction defaults to ascending when omitted. Unknown columns and
    /// malformed clauses fail with a validation error.
    pub fn parse(&self, columns: &[&str]) -> RepositoryResult<Vec<OrderClause>> {
        let raw: Vec<&str> = match self {
            Order::One(clause) => vec![clause.as_str()],
            Order::Many(clauses) => clauses.iter().map(String::as_str).collect(),
        };

        raw.into_iter()
            .map(|clause| parse_clause(clause, columns))
            .collect()
    }
}

fn parse_clause(clause: &str, columns: &[&str]) -> RepositoryResult<OrderClause> {
    let mut parts = clause.split_whitespace();

    let column = parts
        .next()
        .ok_or_else(|| RepositoryError::Validation("Empty order clause".to_string()))?;

    if !columns.contains(&column) {
        return Err(RepositoryError::Validation(format!(
            "Unknown order column: {}",
            column
        )));
    }

    let descending = match parts.next() {
        None => false,
        Some(dir) if dir.eq_ignore_ascii_case("asc") => false,
        Some(dir) if dir.eq_ignore_ascii_case("desc") => true,
        Some(dir) => {
            return Err(RepositoryError::Validation(format!(
                "Invalid order direction: {}",
                dir
            )))
        }
    };

    if parts.next().is_some() {
        return Err(RepositoryError::Validation(format!(
            "Malformed order clause: {}",
            clause
        )));
    }

    Ok(OrderClause {
        column: column.to_string(),
        descending,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const COLUMNS: &[&str] = &["id", "name", "description"];

    #[test]
    fn filter_parses_all_directives() {
        let filter = Filter::from_json(
            r#"{"where": {"name": "alpha"}, "order": "name DESC", "limit": 3, "skip": 1}"#,
        )
        .unwrap();

        assert_eq!(filter.where_.get("name"), Some(&json!("alpha")));
        assert_eq!(filter.limit, Some(3));
        assert_eq!(filter.skip, Some(1));

        let clauses = filter.order.unwrap().parse(COLUMNS).unwrap();
        assert_eq!(
            clauses,
            vec![OrderClause {
                column: "name".to_string(),
                descending: true,
            }]
        );
    }

    #[test]
    fn filter_defaults_when_directives_absent() {
        let filter = Filter::from_json("{}").unwrap();

        assert!(filter.where_.is_empty());
        assert!(filter.order.is_none());
        assert!(filter.limit.is_none());
        assert!(filter.skip.is_none());
    }

    #[test]
    fn malformed_filter_fails_validation() {
        let result = Filter::from_json("not json");

        assert!(matches!(result, Err(RepositoryError::Validation(_))));
    }

    #[test]
    fn order_accepts_array_of_clauses() {
        let order = Order::Many(vec!["name ASC".to_string(), "id desc".to_string()]);

        let clauses = order.parse(COLUMNS).unwrap();

        assert_eq!(clauses.len(), 2);
        assert!(!clauses[0].descending);
        assert!(clauses[1].descending);
    }

    #[test]
    fn order_defaults_to_ascending() {
        let clauses = Order::One("name".to_string()).parse(COLUMNS).unwrap();

        assert_eq!(clauses[0].column, "name");
        assert!(!clauses[0].descending);
    }

    #[test]
    fn order_rejects_unknown_column() {
        let result = Order::One("password DESC".to_string()).parse(COLUMNS);

        assert!(matches!(result, Err(RepositoryError::Validation(_))));
    }

    #[test]
    fn order_rejects_bad_direction() {
        let result = Order::One("name SIDEWAYS".to_string()).parse(COLUMNS);

        assert!(matches!(result, Err(RepositoryError::Validation(_))));
    }

    #[test]
    fn where_set_pins_a_field() {
        let mut where_ = Where::from_json(r#"{"teamId": "ignored"}"#).unwrap();

        where_.set("teamId", json!("pinned"));

        assert_eq!(where_.get("teamId"), Some(&json!("pinned")));
    }
}
