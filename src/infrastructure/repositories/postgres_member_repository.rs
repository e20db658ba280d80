use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::domain::errors::{RepositoryError, RepositoryResult};
use crate::domain::member::{Member, MemberData, MemberPatch};
use crate::domain::query::{Filter, Where};
use crate::domain::repositories::MemberRepository;

/// PostgreSQL implementation of MemberRepository
///
/// Persists members without any database-level foreign key on `team_id`;
/// referential integrity is the gate's job, applied by wrapping this
/// repository in a `GatedMemberRepository`.
pub struct PostgresMemberRepository {
    pool: PgPool,
}

const SELECT_COLUMNS: &str = "id, name, role, team_id";

/// Wire field names accepted in where/order clauses
const FIELDS: &[&str] = &["id", "name", "role", "teamId"];

#[derive(sqlx::FromRow)]
struct MemberRow {
    id: Uuid,
    name: String,
    role: String,
    team_id: Option<Uuid>,
}

impl MemberRow {
    fn into_member(self) -> Member {
        Member::from_persistence(self.id, self.name, self.role, self.team_id)
    }
}

impl PostgresMemberRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a row, keeping the caller-supplied id
    async fn insert(&self, id: Uuid, data: MemberData) -> RepositoryResult<Member> {
        data.validate().map_err(RepositoryError::Validation)?;

        let row = sqlx::query_as::<_, MemberRow>(
            "INSERT INTO members (id, name, role, team_id) VALUES ($1, $2, $3, $4) \
             RETURNING id, name, role, team_id",
        )
        .bind(id)
        .bind(&data.name)
        .bind(&data.role)
        .bind(data.team_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_member())
    }
}

fn not_found(id: Uuid) -> RepositoryError {
    RepositoryError::NotFound(format!("Member not found: {}", id))
}

/// Maps a wire field name onto its SQL column
fn column_for(field: &str) -> RepositoryResult<&'static str> {
    match field {
        "id" => Ok("id"),
        "name" => Ok("name"),
        "role" => Ok("role"),
        "teamId" => Ok("team_id"),
        other => Err(RepositoryError::Validation(format!(
            "Unknown field in where clause: {}",
            other
        ))),
    }
}

/// Renders the where clause into the builder with bound values
///
/// Equality only; `null` becomes `IS NULL`; uuid columns get their values
/// parsed so malformed ids fail fast instead of erroring in Postgres.
fn push_where(qb: &mut QueryBuilder<'_, Postgres>, where_: &Where) -> RepositoryResult<()> {
    if where_.is_empty() {
        return Ok(());
    }

    qb.push(" WHERE ");
    let mut conditions = qb.separated(" AND ");

    for (field, value) in where_.iter() {
        let column = column_for(field)?;
        let is_uuid_column = matches!(column, "id" | "team_id");

        match value {
            Value::Null => {
                conditions.push(format!("{} IS NULL", column));
            }
            Value::String(raw) if is_uuid_column => {
                let id = Uuid::parse_str(raw).map_err(|_| {
                    RepositoryError::Validation(format!(
                        "Invalid {} in where clause: {}",
                        field, raw
                    ))
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

fn where_uuid(where_: &Where, field: &str) -> RepositoryResult<Option<Uuid>> {
    match where_.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) => Uuid::parse_str(raw).map(Some).map_err(|_| {
            RepositoryError::Validation(format!("Invalid {} in where clause: {}", field, raw))
        }),
        Some(other) => Err(RepositoryError::Validation(format!(
            "Unsupported where value for field {}: {}",
            field, other
        ))),
    }
}

#[async_trait]
impl MemberRepository for PostgresMemberRepository {
    async fn create(&self, data: MemberData) -> RepositoryResult<Member> {
        let member = Member::new(data).map_err(RepositoryError::Validation)?;

        let row = sqlx::query_as::<_, MemberRow>(
            "INSERT INTO members (id, name, role, team_id) VALUES ($1, $2, $3, $4) \
             RETURNING id, name, role, team_id",
        )
        .bind(member.id())
        .bind(member.name())
        .bind(member.role())
        .bind(member.team_id())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_member())
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Member>> {
        let row = sqlx::query_as::<_, MemberRow>(
            "SELECT id, name, role, team_id FROM members WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(MemberRow::into_member))
    }

    async fn exists(&self, id: Uuid) -> RepositoryResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM members WHERE id = $1)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn find_all(&self, filter: Filter) -> RepositoryResult<Vec<Member>> {
        let mut qb = QueryBuilder::new(format!("SELECT {} FROM members", SELECT_COLUMNS));
        push_where(&mut qb, &filter.where_)?;
        push_directives(&mut qb, &filter)?;

        let rows = qb
            .build_query_as::<MemberRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(MemberRow::into_member).collect())
    }

    async fn find_one(&self, mut filter: Filter) -> RepositoryResult<Option<Member>> {
        filter.limit = Some(1);
        let members = self.find_all(filter).await?;

        Ok(members.into_iter().next())
    }

    async fn count(&self, where_: Where) -> RepositoryResult<i64> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM members");
        push_where(&mut qb, &where_)?;

        let count = qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        Ok(count)
    }

    async fn update(&self, id: Uuid, patch: MemberPatch) -> RepositoryResult<Member> {
        patch.validate().map_err(RepositoryError::Validation)?;

        if patch.is_empty() {
            return self.find_by_id(id).await?.ok_or_else(|| not_found(id));
        }

        let mut qb = QueryBuilder::new("UPDATE members SET ");
        {
            let mut assignments = qb.separated(", ");
            if let Some(name) = &patch.name {
                assignments.push("name = ");
                assignments.push_bind_unseparated(name.clone());
            }
            if let Some(role) = &patch.role {
                assignments.push("role = ");
                assignments.push_bind_unseparated(role.clone());
            }
            if let Some(team_id) = patch.team_id {
                // Some(None) clears the association
                assignments.push("team_id = ");
                assignments.push_bind_unseparated(team_id);
            }
        }
        qb.push(" WHERE id = ");
        qb.push_bind(id);
        qb.push(format!(" RETURNING {}", SELECT_COLUMNS));

        let row = qb
            .build_query_as::<MemberRow>()
            .fetch_optional(&self.pool)
            .await?;

        row.map(MemberRow::into_member).ok_or_else(|| not_found(id))
    }

    async fn replace(&self, id: Uuid, data: MemberData) -> RepositoryResult<Member> {
        data.validate().map_err(RepositoryError::Validation)?;

        let row = sqlx::query_as::<_, MemberRow>(
            "UPDATE members SET name = $1, role = $2, team_id = $3 WHERE id = $4 \
             RETURNING id, name, role, team_id",
        )
        .bind(&data.name)
        .bind(&data.role)
        .bind(data.team_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(MemberRow::into_member).ok_or_else(|| not_found(id))
    }

    async fn update_all(&self, where_: Where, patch: MemberPatch) -> RepositoryResult<u64> {
        patch.validate().map_err(RepositoryError::Validation)?;

        if patch.is_empty() {
            // Nothing to write; report how many rows the clause matches
            return Ok(self.count(where_).await? as u64);
        }

        let mut qb = QueryBuilder::new("UPDATE members SET ");
        {
            let mut assignments = qb.separated(", ");
            if let Some(name) = &patch.name {
                assignments.push("name = ");
                assignments.push_bind_unseparated(name.clone());
            }
            if let Some(role) = &patch.role {
                assignments.push("role = ");
                assignments.push_bind_unseparated(role.clone());
            }
            if let Some(team_id) = patch.team_id {
                assignments.push("team_id = ");
                assignments.push_bind_unseparated(team_id);
            }
        }
        push_where(&mut qb, &where_)?;

        let result = qb.build().execute(&self.pool).await?;

        Ok(result.rows_affected())
    }

    async fn upsert_with_where(
        &self,
        where_: Where,
        patch: MemberPatch,
    ) -> RepositoryResult<Member> {
        let existing = self
            .find_one(Filter::with_where(where_.clone()))
            .await?;

        match existing {
            Some(member) => self.update(member.id(), patch).await,
            None => {
                // A created record combines the clause's fields with the
                // payload, payload winning
                let name = patch
                    .name
                    .or_else(|| where_string(&where_, "name"))
                    .ok_or_else(|| {
                        RepositoryError::Validation("Member name is required".to_string())
                    })?;
                let role = patch
                    .role
                    .or_else(|| where_string(&where_, "role"))
                    .ok_or_else(|| {
                        RepositoryError::Validation("Member role is required".to_string())
                    })?;
                let team_id = match patch.team_id {
                    Some(explicit) => explicit,
                    None => where_uuid(&where_, "teamId")?,
                };

                self.create(MemberData {
                    name,
                    role,
                    team_id,
                })
                .await
            }
        }
    }

    async fn replace_or_create(
        &self,
        id: Option<Uuid>,
        data: MemberData,
    ) -> RepositoryResult<Member> {
        match id {
            Some(id) if self.exists(id).await? => self.replace(id, data).await,
            Some(id) => self.insert(id, data).await,
            None => self.create(data).await,
        }
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<u64> {
        let result = sqlx::query("DELETE FROM members WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_all(&self, where_: Where) -> RepositoryResult<u64> {
        let mut qb = QueryBuilder::new("DELETE FROM members");
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
    fn where_maps_team_id_to_snake_case_column() {
        let team_id = Uuid::new_v4();
        let mut where_ = Where::new();
        where_.set("teamId", json!(team_id.to_string()));
        let mut qb = QueryBuilder::new("SELECT id FROM members");

        push_where(&mut qb, &where_).unwrap();

        assert_eq!(qb.sql(), "SELECT id FROM members WHERE team_id = $1");
    }

    #[test]
    fn where_null_team_id_matches_unassigned_members() {
        let where_ = Where::from_json(r#"{"teamId": null}"#).unwrap();
        let mut qb = QueryBuilder::new("SELECT id FROM members");

        push_where(&mut qb, &where_).unwrap();

        assert_eq!(qb.sql(), "SELECT id FROM members WHERE team_id IS NULL");
    }

    #[test]
    fn where_rejects_malformed_team_id() {
        let where_ = Where::from_json(r#"{"teamId": "not-a-uuid"}"#).unwrap();
        let mut qb = QueryBuilder::new("SELECT id FROM members");

        let result = push_where(&mut qb, &where_);

        assert!(matches!(result, Err(RepositoryError::Validation(_))));
    }

    #[test]
    fn where_combines_conditions_with_and() {
        let team_id = Uuid::new_v4();
        let where_ = Where::from_json(&format!(
            r#"{{"role": "member", "teamId": "{}"}}"#,
            team_id
        ))
        .unwrap();
        let mut qb = QueryBuilder::new("SELECT id FROM members");

        push_where(&mut qb, &where_).unwrap();

        assert_eq!(
            qb.sql(),
            "SELECT id FROM members WHERE role = $1 AND team_id = $2"
        );
    }

    #[test]
    fn order_accepts_wire_name_for_foreign_key() {
        let filter = Filter::from_json(r#"{"order": "teamId DESC"}"#).unwrap();
        let mut qb = QueryBuilder::new("SELECT id FROM members");

        push_directives(&mut qb, &filter).unwrap();

        assert_eq!(qb.sql(), "SELECT id FROM members ORDER BY team_id DESC");
    }

    #[test]
    fn where_uuid_parses_and_validates() {
        let team_id = Uuid::new_v4();
        let where_ = Where::from_json(&format!(r#"{{"teamId": "{}"}}"#, team_id)).unwrap();

        assert_eq!(where_uuid(&where_, "teamId").unwrap(), Some(team_id));
        assert_eq!(where_uuid(&where_, "missing").unwrap(), None);

        let bad = Where::from_json(r#"{"teamId": 7}"#).unwrap();
        assert!(where_uuid(&bad, "teamId").is_err());
    }
}
