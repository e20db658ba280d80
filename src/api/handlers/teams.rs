use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::handlers::{CountResponse, ExistsResponse, FilterQuery, WhereQuery};
use crate::domain::repositories::TeamRepository;
use crate::domain::team::{Team, TeamData, TeamPatch};
use crate::infrastructure::repositories::PostgresTeamRepository;

/// Team record as serialized on the wire
#[derive(Debug, Serialize)]
pub struct TeamResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

impl From<&Team> for TeamResponse {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id(),
            name: team.name().to_string(),
            description: team.description().map(str::to_string),
        }
    }
}

/// Bulk payload carrying an optional embedded id alongside a patch
#[derive(Debug, Deserialize)]
pub struct TeamPatchById {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(flatten)]
    pub patch: TeamPatch,
}

/// Bulk payload carrying an optional embedded id alongside full data
#[derive(Debug, Deserialize)]
pub struct TeamDataById {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(flatten)]
    pub data: TeamData,
}

fn repo(pool: PgPool) -> PostgresTeamRepository {
    PostgresTeamRepository::new(pool)
}

/// List teams matching an optional filter
///
/// GET /api/Teams
pub async fn list_teams(
    State(pool): State<PgPool>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<Vec<TeamResponse>>, ApiError> {
    let filter = query.parse()?;
    let teams = repo(pool).find_all(filter).await?;

    Ok(Json(teams.iter().map(TeamResponse::from).collect()))
}

/// Create a new team
///
/// POST /api/Teams
pub async fn create_team(
    State(pool): State<PgPool>,
    Json(data): Json<TeamData>,
) -> Result<Json<TeamResponse>, ApiError> {
    let team = repo(pool).create(data).await?;

    Ok(Json(TeamResponse::from(&team)))
}

/// Patch a team identified by its embedded id, creating when no id is given
///
/// PATCH /api/Teams
pub async fn patch_teams(
    State(pool): State<PgPool>,
    Json(body): Json<TeamPatchById>,
) -> Result<Json<TeamResponse>, ApiError> {
    let repo = repo(pool);

    let team = match body.id {
        Some(id) => repo.update(id, body.patch).await?,
        None => {
            let name = body
                .patch
                .name
                .ok_or_else(|| ApiError::bad_request("Team name is required"))?;
            repo.create(TeamData {
                name,
                description: body.patch.description,
            })
            .await?
        }
    };

    Ok(Json(TeamResponse::from(&team)))
}

/// Replace a team identified by its embedded id, creating when absent
///
/// PUT /api/Teams
pub async fn replace_teams(
    State(pool): State<PgPool>,
    Json(body): Json<TeamDataById>,
) -> Result<Json<TeamResponse>, ApiError> {
    let team = repo(pool).replace_or_create(body.id, body.data).await?;

    Ok(Json(TeamResponse::from(&team)))
}

/// Count teams matching an optional where clause
///
/// GET /api/Teams/count
pub async fn count_teams(
    State(pool): State<PgPool>,
    Query(query): Query<WhereQuery>,
) -> Result<Json<CountResponse>, ApiError> {
    let where_ = query.parse()?;
    let count = repo(pool).count(where_).await?;

    Ok(Json(CountResponse {
        count: count as u64,
    }))
}

/// Return the first team matching the filter
///
/// GET /api/Teams/findOne
pub async fn find_one_team(
    State(pool): State<PgPool>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<TeamResponse>, ApiError> {
    let filter = query.parse()?;
    let team = repo(pool)
        .find_one(filter)
        .await?
        .ok_or_else(|| ApiError::not_found("No Team record matched the filter"))?;

    Ok(Json(TeamResponse::from(&team)))
}

/// Replace a team by its embedded id, or create one
///
/// POST /api/Teams/replaceOrCreate
pub async fn replace_or_create_team(
    State(pool): State<PgPool>,
    Json(body): Json<TeamDataById>,
) -> Result<Json<TeamResponse>, ApiError> {
    let team = repo(pool).replace_or_create(body.id, body.data).await?;

    Ok(Json(TeamResponse::from(&team)))
}

/// Apply a patch to every team matching the where clause
///
/// POST /api/Teams/update
pub async fn update_teams(
    State(pool): State<PgPool>,
    Query(query): Query<WhereQuery>,
    Json(patch): Json<TeamPatch>,
) -> Result<Json<CountResponse>, ApiError> {
    let where_ = query.parse()?;
    let count = repo(pool).update_all(where_, patch).await?;

    Ok(Json(CountResponse { count }))
}

/// Update the first team matching the where clause, or create one
///
/// POST /api/Teams/upsertWithWhere
pub async fn upsert_with_where_team(
    State(pool): State<PgPool>,
    Query(query): Query<WhereQuery>,
    Json(patch): Json<TeamPatch>,
) -> Result<Json<TeamResponse>, ApiError> {
    let where_ = query.parse()?;
    let team = repo(pool).upsert_with_where(where_, patch).await?;

    Ok(Json(TeamResponse::from(&team)))
}

/// Get a team by ID
///
/// GET /api/Teams/:id (also serves HEAD)
pub async fn get_team(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<Json<TeamResponse>, ApiError> {
    let team = repo(pool)
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Team not found: {}", id)))?;

    Ok(Json(TeamResponse::from(&team)))
}

/// Replace a team by ID
///
/// PUT /api/Teams/:id
pub async fn put_team(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
    Json(data): Json<TeamData>,
) -> Result<Json<TeamResponse>, ApiError> {
    let team = repo(pool).replace(id, data).await?;

    Ok(Json(TeamResponse::from(&team)))
}

/// Patch a team by ID
///
/// PATCH /api/Teams/:id
pub async fn patch_team(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
    Json(patch): Json<TeamPatch>,
) -> Result<Json<TeamResponse>, ApiError> {
    let team = repo(pool).update(id, patch).await?;

    Ok(Json(TeamResponse::from(&team)))
}

/// Delete a team by ID
///
/// DELETE /api/Teams/:id
///
/// Returns 200 with the removed count; deleting an id that is already gone
/// reports `{count: 0}` rather than 404. Never cascades to members.
pub async fn delete_team(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<Json<CountResponse>, ApiError> {
    let count = repo(pool).delete(id).await?;

    Ok(Json(CountResponse { count }))
}

/// Check whether a team exists
///
/// GET /api/Teams/:id/exists
pub async fn team_exists(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExistsResponse>, ApiError> {
    let exists = repo(pool).exists(id).await?;

    Ok(Json(ExistsResponse { exists }))
}

/// Replace a team via a path id; the payload need not carry the id
///
/// POST /api/Teams/:id/replace
pub async fn replace_team(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
    Json(data): Json<TeamData>,
) -> Result<Json<TeamResponse>, ApiError> {
    let team = repo(pool).replace(id, data).await?;

    Ok(Json(TeamResponse::from(&team)))
}
