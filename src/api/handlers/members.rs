use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::handlers::{CountResponse, ExistsResponse, FilterQuery, WhereQuery};
use crate::domain::gate::GatedMemberRepository;
use crate::domain::member::{Member, MemberData, MemberPatch};
use crate::domain::repositories::MemberRepository;
use crate::infrastructure::repositories::{PostgresMemberRepository, PostgresTeamRepository};

/// Member record as serialized on the wire
#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub id: Uuid,
    pub name: String,
    pub role: String,
    #[serde(rename = "teamId")]
    pub team_id: Option<Uuid>,
}

impl From<&Member> for MemberResponse {
    fn from(member: &Member) -> Self {
        Self {
            id: member.id(),
            name: member.name().to_string(),
            role: member.role().to_string(),
            team_id: member.team_id(),
        }
    }
}

/// Bulk payload carrying an optional embedded id alongside a patch
#[derive(Debug, Deserialize)]
pub struct MemberPatchById {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(flatten)]
    pub patch: MemberPatch,
}

/// Bulk payload carrying an optional embedded id alongside full data
#[derive(Debug, Deserialize)]
pub struct MemberDataById {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(flatten)]
    pub data: MemberData,
}

/// Builds the member repository with the referential-integrity gate wired
/// to the team repository; every member write in the API goes through this
pub(crate) fn repo(
    pool: PgPool,
) -> GatedMemberRepository<PostgresMemberRepository, PostgresTeamRepository> {
    GatedMemberRepository::new(
        PostgresMemberRepository::new(pool.clone()),
        PostgresTeamRepository::new(pool),
    )
}

/// List members matching an optional filter
///
/// GET /api/Members
pub async fn list_members(
    State(pool): State<PgPool>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<Vec<MemberResponse>>, ApiError> {
    let filter = query.parse()?;
    let members = repo(pool).find_all(filter).await?;

    Ok(Json(members.iter().map(MemberResponse::from).collect()))
}

/// Create a new member; a supplied teamId must reference an existing team
///
/// POST /api/Members
pub async fn create_member(
    State(pool): State<PgPool>,
    Json(data): Json<MemberData>,
) -> Result<Json<MemberResponse>, ApiError> {
    let member = repo(pool).create(data).await?;

    Ok(Json(MemberResponse::from(&member)))
}

/// Patch a member identified by its embedded id, creating when no id is given
///
/// PATCH /api/Members
pub async fn patch_members(
    State(pool): State<PgPool>,
    Json(body): Json<MemberPatchById>,
) -> Result<Json<MemberResponse>, ApiError> {
    let repo = repo(pool);

    let member = match body.id {
        Some(id) => repo.update(id, body.patch).await?,
        None => {
            let name = body
                .patch
                .name
                .ok_or_else(|| ApiError::bad_request("Member name is required"))?;
            let role = body
                .patch
                .role
                .ok_or_else(|| ApiError::bad_request("Member role is required"))?;
            repo.create(MemberData {
                name,
                role,
                team_id: body.patch.team_id.flatten(),
            })
            .await?
        }
    };

    Ok(Json(MemberResponse::from(&member)))
}

/// Replace a member identified by its embedded id, creating when absent
///
/// PUT /api/Members
pub async fn replace_members(
    State(pool): State<PgPool>,
    Json(body): Json<MemberDataById>,
) -> Result<Json<MemberResponse>, ApiError> {
    let member = repo(pool).replace_or_create(body.id, body.data).await?;

    Ok(Json(MemberResponse::from(&member)))
}

/// Count members matching an optional where clause
///
/// GET /api/Members/count
pub async fn count_members(
    State(pool): State<PgPool>,
    Query(query): Query<WhereQuery>,
) -> Result<Json<CountResponse>, ApiError> {
    let where_ = query.parse()?;
    let count = repo(pool).count(where_).await?;

    Ok(Json(CountResponse {
        count: count as u64,
    }))
}

/// Return the first member matching the filter
///
/// GET /api/Members/findOne
pub async fn find_one_member(
    State(pool): State<PgPool>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<MemberResponse>, ApiError> {
    let filter = query.parse()?;
    let member = repo(pool)
        .find_one(filter)
        .await?
        .ok_or_else(|| ApiError::not_found("No Member record matched the filter"))?;

    Ok(Json(MemberResponse::from(&member)))
}

/// Replace a member by its embedded id, or create one
///
/// POST /api/Members/replaceOrCreate
pub async fn replace_or_create_member(
    State(pool): State<PgPool>,
    Json(body): Json<MemberDataById>,
) -> Result<Json<MemberResponse>, ApiError> {
    let member = repo(pool).replace_or_create(body.id, body.data).await?;

    Ok(Json(MemberResponse::from(&member)))
}

/// Apply a patch to every member matching the where clause
///
/// POST /api/Members/update
pub async fn update_members(
    State(pool): State<PgPool>,
    Query(query): Query<WhereQuery>,
    Json(patch): Json<MemberPatch>,
) -> Result<Json<CountResponse>, ApiError> {
    let where_ = query.parse()?;
    let count = repo(pool).update_all(where_, patch).await?;

    Ok(Json(CountResponse { count }))
}

/// Update the first member matching the where clause, or create one
///
/// POST /api/Members/upsertWithWhere
pub async fn upsert_with_where_member(
    State(pool): State<PgPool>,
    Query(query): Query<WhereQuery>,
    Json(patch): Json<MemberPatch>,
) -> Result<Json<MemberResponse>, ApiError> {
    let where_ = query.parse()?;
    let member = repo(pool).upsert_with_where(where_, patch).await?;

    Ok(Json(MemberResponse::from(&member)))
}

/// Get a member by ID
///
/// GET /api/Members/:id (also serves HEAD)
pub async fn get_member(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<Json<MemberResponse>, ApiError> {
    let member = repo(pool)
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Member not found: {}", id)))?;

    Ok(Json(MemberResponse::from(&member)))
}

/// Replace a member by ID
///
/// PUT /api/Members/:id
pub async fn put_member(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
    Json(data): Json<MemberData>,
) -> Result<Json<MemberResponse>, ApiError> {
    let member = repo(pool).replace(id, data).await?;

    Ok(Json(MemberResponse::from(&member)))
}

/// Patch a member by ID
///
/// PATCH /api/Members/:id
pub async fn patch_member(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
    Json(patch): Json<MemberPatch>,
) -> Result<Json<MemberResponse>, ApiError> {
    let member = repo(pool).update(id, patch).await?;

    Ok(Json(MemberResponse::from(&member)))
}

/// Delete a member by ID
///
/// DELETE /api/Members/:id
///
/// Returns 200 with the removed count; deleting an id that is already gone
/// reports `{count: 0}` rather than 404.
pub async fn delete_member(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<Json<CountResponse>, ApiError> {
    let count = repo(pool).delete(id).await?;

    Ok(Json(CountResponse { count }))
}

/// Check whether a member exists
///
/// GET /api/Members/:id/exists
pub async fn member_exists(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExistsResponse>, ApiError> {
    let exists = repo(pool).exists(id).await?;

    Ok(Json(ExistsResponse { exists }))
}

/// Replace a member via a path id; the payload need not carry the id
///
/// POST /api/Members/:id/replace
pub async fn replace_member(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
    Json(data): Json<MemberData>,
) -> Result<Json<MemberResponse>, ApiError> {
    let member = repo(pool).replace(id, data).await?;

    Ok(Json(MemberResponse::from(&member)))
}
