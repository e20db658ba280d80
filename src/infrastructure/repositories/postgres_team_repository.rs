use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::domain::errors::{RepositoryError, RepositoryResult};
use crate::domain::query::{Filter, Where};
use crate::domain::repositories::TeamRepository;
use crate::domain::team::{Team, TeamData, TeamPatch};

/// PostgreSQL implementation of TeamRepository
///
/// Dynamic where/order clauses are rendered with `QueryBuilder` against a
/// column whitelist; all values go through bound parameters.
pub struct PostgresTeamRepository {
    pool: PgPool,
}

const SELECT_COLUMNS: &str = "id, name, description";

/// Wire field names accepted in where/order clauses
const FIELDS: &[&str] = &["id", "name", "description"];

#[derive(sqlx::FromRow)]
struct TeamRow {
    id: Uuid,
    name: String,
    description: Option<String>,
}

impl TeamRow {
    fn into_team(self) -> Team {
        Team::from_persistence(self.id, self.name, self.description)
    }
}

impl PostgresTeamRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a row, keeping the caller-supplied id
    async fn insert(&self, id: Uuid, data: TeamData) -> RepositoryResult<Team> {
        data.validate().map_err(RepositoryError::Validation)?;

        let row = sqlx::query_as::<_, TeamRow>(
            "INSERT INTO teams (id, name, description) VALUES ($1, $2, $3) \
             RETURNING id, name, description",
        )
        .bind(id)
        .bind(&data.name)
        .bind(&data.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_team())
    }
}

fn not_found(id: Uuid) -> RepositoryError {
    RepositoryError::NotFound(format!("Team not found: {}", id))
}

/// Maps a wire field name onto its SQL column
fn column_for(field: &str) -> RepositoryResult<&'static str> {
    match field {
        "id" => Ok("id"),
        "name" => Ok("name"),
        "description" => Ok("description"),
        other => Err(RepositoryError::Validation(format!(
            "Unknown field in where clause: {}",
            other
        ))),
    }
}

/// Renders the where clause into the builder with bound values
///
/// Equality only; `null` becomes `IS NULL`; nested objects (operator
/// syntax) are rejected.
fn push_where(qb: &mut QueryBuilder<'_, Postgres>, where_: &Where) -> RepositoryResult<()> {
    if where_.is_empty() {
        return Ok(());
    }

    qb.push(" WHERE ");
    let mut conditions = qb.separated(" AND ");

    for (field, value) in where_.iter() {
        let column = column_for(field)?;

        match value {
            Value::Null => {
                conditions.push(format!("{} IS NULL", column));
            }
            Value::String(raw) if column == "id" => {
                let id = Uuid::parse_str(raw).map_err(|_| {
                    RepositoryError::Validation(format!("Invalid id in where clause: {}", raw))
                })?;
                conditions.push(format!("{} = ", column));
                conditions.push_bind_unseparated(id);
            }
            Value::String(raw) => {
                conditions.push(format!("{} = ", column));
                conditions.push_bind_unseparated(raw.clone());
            }
            Value::Object(_) => {
                return Err(RepositoryError::Validation(format!(
                    "Unsupported where operator for field: {}",
                    field
                )));
            }
            other => {
                return Err(RepositoryError::Validation(format!(
                    "Unsupported where value for field {}: {}",
                    field, other
                )));
            }
        }
    }

    Ok(())
}

/// Renders order/limit/skip directives into the builder
fn push_directives(qb: &mut QueryBuilder<'_, Postgres>, filter: &Filter) -> RepositoryResult<()> {
    if let Some(order) = &filter.order {
        let clauses = order.parse(FIELDS)?;
        qb.push(" ORDER BY ");
        let mut rendered = qb.separated(", ");
        for clause in clauses {
            let column = column_for(&clause.column)?;
            let direction = if clause.descending { "DESC" } else { "ASC" };
            rendered.push(format!("{} {}", column, direction));
        }
    }

    if let Some(limit) = filter.limit {
        if limit < 0 {
            return Err(RepositoryError::Validation(format!(
                "Invalid limit: {}",
                limit
            )));
        }
        qb.push(" LIMIT ");
        qb.push_bind(limit);
    }

    if let Some(skip) = filter.skip {
        if skip < 0 {
            return Err(RepositoryError::Validation(format!(
                "Invalid skip: {}",
                skip
            )));
        }
        qb.push(" OFFSET ");
        qb.push_bind(skip);
    }

    Ok(())
}

fn where_string(where_: &Where, field: &str) -> Option<String> {
    where_
        .get(field)
        .and_then(|value| value.as_str())
        .map(str::to_string)
}

#[async_trait]
impl TeamRepository for PostgresTeamRepository {
    async fn create(&self, data: TeamData) -> RepositoryResult<Team> {
        let team = Team::new(data).map_err(RepositoryError::Validation)?;

        let row = sqlx::query_as::<_, TeamRow>(
            "INSERT INTO teams (id, name, description) VALUES ($1, $2, $3) \
             RETURNING id, name, description",
        )
        .bind(team.id())
        .bind(team.name())
        .bind(team.description())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_team())
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Team>> {
        let row = sqlx::query_as::<_, TeamRow>(
            "SELECT id, name, description FROM teams WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(TeamRow::into_team))
    }

    async fn exists(&self, id: Uuid) -> RepositoryResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM teams WHERE id = $1)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn find_all(&self, filter: Filter) -> RepositoryResult<Vec<Team>> {
        let mut qb = QueryBuilder::new(format!("SELECT {} FROM teams", SELECT_COLUMNS));
        push_where(&mut qb, &filter.where_)?;
        push_directives(&mut qb, &filter)?;

        let rows = qb
            .build_query_as::<TeamRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(TeamRow::into_team).collect())
    }

    async fn find_one(&self, mut filter: Filter) -> RepositoryResult<Option<Team>> {
        filter.limit = Some(1);
        let teams = self.find_all(filter).await?;

        Ok(teams.into_iter().next())
    }

    async fn count(&self, where_: Where) -> RepositoryResult<i64> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM teams");
        push_where(&mut qb, &where_)?;

        let count = qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        Ok(count)
    }

    async fn update(&self, id: Uuid, patch: TeamPatch) -> RepositoryResult<Team> {
        patch.validate().map_err(RepositoryError::Validation)?;

        if patch.is_empty() {
            return self.find_by_id(id).await?.ok_or_else(|| not_found(id));
        }

        let mut qb = QueryBuilder::new("UPDATE teams SET ");
        {
            let mut assignments = qb.separated(", ");
            if let Some(name) = &patch.name {
                assignments.push("name = ");
                assignments.push_bind_unseparated(name.clone());
            }
            if let Some(description) = &patch.description {
                assignments.push("description = ");
                assignments.push_bind_unseparated(description.clone());
            }
        }
        qb.push(" WHERE id = ");
        qb.push_bind(id);
        qb.push(format!(" RETURNING {}", SELECT_COLUMNS));

        let row = qb
            .build_query_as::<TeamRow>()
            .fetch_optional(&self.pool)
            .await?;

        row.map(TeamRow::into_team).ok_or_else(|| not_found(id))
    }

    async fn replace(&self, id: Uuid, data: TeamData) -> RepositoryResult<Team> {
        data.validate().map_err(RepositoryError::Validation)?;

        let row = sqlx::query_as::<_, TeamRow>(
            "UPDATE teams SET name = $1, description = $2 WHERE id = $3 \
             RETURNING id, name, description",
        )
        .bind(&data.name)
        .bind(&data.description)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TeamRow::into_team).ok_or_else(|| not_found(id))
    }

    async fn update_all(&self, where_: Where, patch: TeamPatch) -> RepositoryResult<u64> {
        patch.validate().map_err(RepositoryError::Validation)?;

        if patch.is_empty() {
            // Nothing to write; report how many rows the clause matches
            return Ok(self.count(where_).await? as u64);
        }

        let mut qb = QueryBuilder::new("UPDATE teams SET ");
        {
            let mut assignments = qb.separated(", ");
            if let Some(name) = &patch.name {
                assignments.push("name = ");
                assignments.push_bind_unseparated(name.clone());
            }
            if let Some(description) = &patch.description {
                assignments.push("description = ");
                assignments.push_bind_unseparated(description.clone());
            }
        }
        push_where(&mut qb, &where_)?;

        let result = qb.build().execute(&self.pool).await?;

        Ok(result.rows_affected())
    }

    async fn upsert_with_where(&self, where_: Where, patch: TeamPatch) -> RepositoryResult<Team> {
        let existing = self
            .find_one(Filter::with_where(where_.clone()))
            .await?;

        match existing {
            Some(team) => self.update(team.id(), patch).await,
            None => {
                // A created record combines the clause's fields with the
                // payload, payload winning
                let name = patch
                    .name
                    .or_else(|| where_string(&where_, "name"))
                    .ok_or_else(|| {
                        RepositoryError::Validation("Team name is required".to_string())
                    })?;
                let description = patch
                    .description
                    .or_else(|| where_string(&where_, "description"));

                self.create(TeamData { name, description }).await
            }
        }
    }

    async fn replace_or_create(&self, id: Option<Uuid>, data: TeamData) -> RepositoryResult<Team> {
        match id {
            Some(id) if self.exists(id).await? => self.replace(id, data).await,
            Some(id) => self.insert(id, data).await,
            None => self.create(data).await,
        }
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<u64> {
        let result = sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_all(&self, where_: Where) -> RepositoryResult<u64> {
        let mut qb = QueryBuilder::new("DELETE FROM teams");
        push_where(&mut qb, &where_)?;

        let result = qb.build().execute(&self.pool).await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn where_renders_equality_with_bound_values() {
        let where_ = Where::from_json(r#"{"name": "alpha"}"#).unwrap();
        let mut qb = QueryBuilder::new("SELECT id FROM teams");

        push_where(&mut qb, &where_).unwrap();

        assert_eq!(qb.sql(), "SELECT id FROM teams WHERE name = $1");
    }

    #[test]
    fn where_renders_null_as_is_null() {
        let where_ = Where::from_json(r#"{"description": null}"#).unwrap();
        let mut qb = QueryBuilder::new("SELECT id FROM teams");

        push_where(&mut qb, &where_).unwrap();

        assert_eq!(qb.sql(), "SELECT id FROM teams WHERE description IS NULL");
    }

    #[test]
    fn where_rejects_unknown_field() {
        let where_ = Where::from_json(r#"{"password": "x"}"#).unwrap();
        let mut qb = QueryBuilder::new("SELECT id FROM teams");

        let result = push_where(&mut qb, &where_);

        assert!(matches!(result, Err(RepositoryError::Validation(_))));
    }

    #[test]
    fn where_rejects_operator_objects() {
        let where_ = Where::from_json(r#"{"name": {"like": "a%"}}"#).unwrap();
        let mut qb = QueryBuilder::new("SELECT id FROM teams");

        let result = push_where(&mut qb, &where_);

        assert!(matches!(result, Err(RepositoryError::Validation(_))));
    }

    #[test]
    fn where_rejects_malformed_id() {
        let where_ = Where::from_json(r#"{"id": "not-a-uuid"}"#).unwrap();
        let mut qb = QueryBuilder::new("SELECT id FROM teams");

        let result = push_where(&mut qb, &where_);

        assert!(matches!(result, Err(RepositoryError::Validation(_))));
    }

    #[test]
    fn directives_render_order_limit_and_skip() {
        let filter = Filter::from_json(
            r#"{"order": ["name DESC", "id"], "limit": 10, "skip": 5}"#,
        )
        .unwrap();
        let mut qb = QueryBuilder::new("SELECT id FROM teams");

        push_directives(&mut qb, &filter).unwrap();

        assert_eq!(
            qb.sql(),
            "SELECT id FROM teams ORDER BY name DESC, id ASC LIMIT $1 OFFSET $2"
        );
    }

    #[test]
    fn directives_reject_negative_limit() {
        let filter = Filter::from_json(r#"{"limit": -1}"#).unwrap();
        let mut qb = QueryBuilder::new("SELECT id FROM teams");

        let result = push_directives(&mut qb, &filter);

        assert!(matches!(result, Err(RepositoryError::Validation(_))));
    }

    #[test]
    fn where_string_extracts_payload_fields() {
        let where_ = Where::from_json(r#"{"name": "alpha", "description": null}"#).unwrap();

        assert_eq!(where_string(&where_, "name"), Some("alpha".to_string()));
        assert_eq!(where_string(&where_, "description"), None);
        assert_eq!(where_string(&where_, "missing"), None);
    }

    #[test]
    fn where_set_value_is_rendered() {
        let mut where_ = Where::new();
        where_.set("id", json!(Uuid::new_v4().to_string()));
        let mut qb = QueryBuilder::new("SELECT id FROM teams");

        push_where(&mut qb, &where_).unwrap();

        assert_eq!(qb.sql(), "SELECT id FROM teams WHERE id = $1");
    }
}
