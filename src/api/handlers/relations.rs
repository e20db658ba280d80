//! Relation-traversal routes
//!
//! Translates paths like "members of team X" into member-repository calls
//! with the `teamId` foreign key pinned to the path's team. The same scoped
//! operations back both `/api/Teams/:id/members[...]` and
//! `/api/Members/:id/team/members[...]`; the latter first resolves the
//! member's own team.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::handlers::members::{repo as member_repo, MemberResponse};
use crate::api::handlers::teams::TeamResponse;
use crate::api::handlers::{CountResponse, FilterQuery, WhereQuery};
use crate::domain::member::{MemberData, MemberPatch};
use crate::domain::query::{Filter, Where};
use crate::domain::repositories::{MemberRepository, TeamRepository};
use crate::domain::team::Team;
use crate::infrastructure::repositories::PostgresTeamRepository;

/// Resolves the path's team id, failing with 404 before any member
/// operation runs
async fn resolve_team(pool: &PgPool, id: Uuid) -> Result<Team, ApiError> {
    PostgresTeamRepository::new(pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Team not found: {}", id)))
}

/// Resolves the team a member belongs to
///
/// 404 when the member does not exist, has no team, or the referenced team
/// no longer exists (a dangling reference).
async fn team_of_member(pool: &PgPool, member_id: Uuid) -> Result<Team, ApiError> {
    let member = member_repo(pool.clone())
        .find_by_id(member_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Member not found: {}", member_id)))?;

    let team_id = member
        .team_id()
        .ok_or_else(|| ApiError::not_found(format!("Member {} has no team", member_id)))?;

    resolve_team(pool, team_id).await
}

/// Pins the foreign key to the owning team, overriding any caller-supplied
/// condition on it
fn pin_team(mut where_: Where, team_id: Uuid) -> Where {
    where_.set("teamId", json!(team_id.to_string()));
    where_
}

// ===== Scoped operations shared by both route families =====

async fn list_scoped(
    pool: PgPool,
    team_id: Uuid,
    query: FilterQuery,
) -> Result<Json<Vec<MemberResponse>>, ApiError> {
    let mut filter = query.parse()?;
    filter.where_ = pin_team(filter.where_, team_id);

    let members = member_repo(pool).find_all(filter).await?;

    Ok(Json(members.iter().map(MemberResponse::from).collect()))
}

async fn create_scoped(
    pool: PgPool,
    team_id: Uuid,
    mut data: MemberData,
) -> Result<Json<MemberResponse>, ApiError> {
    // The path owns the relation: whatever teamId the payload carries is
    // overridden, so the gate passes by construction
    data.team_id = Some(team_id);

    let member = member_repo(pool).create(data).await?;

    Ok(Json(MemberResponse::from(&member)))
}

async fn find_scoped(
    pool: &PgPool,
    team_id: Uuid,
    fk: Uuid,
) -> Result<MemberResponse, ApiError> {
    let mut where_ = Where::new();
    where_.set("id", json!(fk.to_string()));
    let where_ = pin_team(where_, team_id);

    let member = member_repo(pool.clone())
        .find_one(Filter::with_where(where_))
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Member not found: {}", fk)))?;

    Ok(MemberResponse::from(&member))
}

async fn update_scoped(
    pool: PgPool,
    team_id: Uuid,
    fk: Uuid,
    mut patch: MemberPatch,
) -> Result<Json<MemberResponse>, ApiError> {
    // Scope check first so a member of another team reads as absent
    find_scoped(&pool, team_id, fk).await?;

    // The relation keeps the member on this team
    patch.team_id = Some(Some(team_id));

    let member = member_repo(pool).update(fk, patch).await?;

    Ok(Json(MemberResponse::from(&member)))
}

async fn delete_scoped(pool: PgPool, team_id: Uuid, fk: Uuid) -> Result<StatusCode, ApiError> {
    find_scoped(&pool, team_id, fk).await?;

    member_repo(pool).delete(fk).await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn count_scoped(
    pool: PgPool,
    team_id: Uuid,
    query: WhereQuery,
) -> Result<Json<CountResponse>, ApiError> {
    let where_ = pin_team(query.parse()?, team_id);

    let count = member_repo(pool).count(where_).await?;

    Ok(Json(CountResponse {
        count: count as u64,
    }))
}

async fn delete_all_scoped(pool: PgPool, team_id: Uuid) -> Result<StatusCode, ApiError> {
    let where_ = pin_team(Where::new(), team_id);

    member_repo(pool).delete_all(where_).await?;

    Ok(StatusCode::NO_CONTENT)
}

// ===== /api/Teams/:id/members routes =====

/// GET /api/Teams/:id/members
pub async fn list_team_members(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<Vec<MemberResponse>>, ApiError> {
    let team = resolve_team(&pool, id).await?;
    list_scoped(pool, team.id(), query).await
}

/// POST /api/Teams/:id/members
pub async fn create_team_member(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
    Json(data): Json<MemberData>,
) -> Result<Json<MemberResponse>, ApiError> {
    let team = resolve_team(&pool, id).await?;
    create_scoped(pool, team.id(), data).await
}

/// DELETE /api/Teams/:id/members
pub async fn delete_team_members(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let team = resolve_team(&pool, id).await?;
    delete_all_scoped(pool, team.id()).await
}

/// GET /api/Teams/:id/members/count
pub async fn count_team_members(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
    Query(query): Query<WhereQuery>,
) -> Result<Json<CountResponse>, ApiError> {
    let team = resolve_team(&pool, id).await?;
    count_scoped(pool, team.id(), query).await
}

/// GET /api/Teams/:id/members/:fk
pub async fn get_team_member(
    State(pool): State<PgPool>,
    Path((id, fk)): Path<(Uuid, Uuid)>,
) -> Result<Json<MemberResponse>, ApiError> {
    let team = resolve_team(&pool, id).await?;
    Ok(Json(find_scoped(&pool, team.id(), fk).await?))
}

/// PUT /api/Teams/:id/members/:fk
pub async fn update_team_member(
    State(pool): State<PgPool>,
    Path((id, fk)): Path<(Uuid, Uuid)>,
    Json(patch): Json<MemberPatch>,
) -> Result<Json<MemberResponse>, ApiError> {
    let team = resolve_team(&pool, id).await?;
    update_scoped(pool, team.id(), fk, patch).await
}

/// DELETE /api/Teams/:id/members/:fk
pub async fn delete_team_member(
    State(pool): State<PgPool>,
    Path((id, fk)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let team = resolve_team(&pool, id).await?;
    delete_scoped(pool, team.id(), fk).await
}

// ===== /api/Members/:id/team routes =====

/// GET /api/Members/:id/team
pub async fn get_member_team(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<Json<TeamResponse>, ApiError> {
    let team = team_of_member(&pool, id).await?;

    Ok(Json(TeamResponse::from(&team)))
}

/// GET /api/Members/:id/team/members
pub async fn list_sibling_members(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<Vec<MemberResponse>>, ApiError> {
    let team = team_of_member(&pool, id).await?;
    list_scoped(pool, team.id(), query).await
}

/// POST /api/Members/:id/team/members
pub async fn create_sibling_member(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
    Json(data): Json<MemberData>,
) -> Result<Json<MemberResponse>, ApiError> {
    let team = team_of_member(&pool, id).await?;
    create_scoped(pool, team.id(), data).await
}

/// DELETE /api/Members/:id/team/members
pub async fn delete_sibling_members(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let team = team_of_member(&pool, id).await?;
    delete_all_scoped(pool, team.id()).await
}

/// GET /api/Members/:id/team/members/count
pub async fn count_sibling_members(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
    Query(query): Query<WhereQuery>,
) -> Result<Json<CountResponse>, ApiError> {
    let team = team_of_member(&pool, id).await?;
    count_scoped(pool, team.id(), query).await
}

/// GET /api/Members/:id/team/members/:fk
pub async fn get_sibling_member(
    State(pool): State<PgPool>,
    Path((id, fk)): Path<(Uuid, Uuid)>,
) -> Result<Json<MemberResponse>, ApiError> {
    let team = team_of_member(&pool, id).await?;
    Ok(Json(find_scoped(&pool, team.id(), fk).await?))
}

/// PUT /api/Members/:id/team/members/:fk
pub async fn update_sibling_member(
    State(pool): State<PgPool>,
    Path((id, fk)): Path<(Uuid, Uuid)>,
    Json(patch): Json<MemberPatch>,
) -> Result<Json<MemberResponse>, ApiError> {
    let team = team_of_member(&pool, id).await?;
    update_scoped(pool, team.id(), fk, patch).await
}

/// DELETE /api/Members/:id/team/members/:fk
pub async fn delete_sibling_member(
    State(pool): State<PgPool>,
    Path((id, fk)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let team = team_of_member(&pool, id).await?;
    delete_scoped(pool, team.id(), fk).await
}
