use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::RepositoryResult;
use crate::domain::query::{Filter, Where};
use crate::domain::team::{Team, TeamData, TeamPatch};

/// Repository trait for the Team entity
///
/// Defines the uniform CRUD and query contract. Implementations handle
/// database-specific details; filters are equality-only where clauses with
/// optional order/limit/skip directives.
#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// Persists a new team and returns it with its generated id
    async fn create(&self, data: TeamData) -> RepositoryResult<Team>;

    /// Finds a team by its id
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Team>>;

    /// Checks whether a team with the given id exists; never errors on a
    /// missing id
    async fn exists(&self, id: Uuid) -> RepositoryResult<bool>;

    /// Returns all teams matching the filter, empty when none match
    async fn find_all(&self, filter: Filter) -> RepositoryResult<Vec<Team>>;

    /// Returns the first team matching the filter
    async fn find_one(&self, filter: Filter) -> RepositoryResult<Option<Team>>;

    /// Counts teams matching the where clause
    async fn count(&self, where_: Where) -> RepositoryResult<i64>;

    /// Merges the patch into an existing team; `NotFound` if the id is absent
    async fn update(&self, id: Uuid, patch: TeamPatch) -> RepositoryResult<Team>;

    /// Overwrites all non-id fields; `NotFound` if the id is absent
    async fn replace(&self, id: Uuid, data: TeamData) -> RepositoryResult<Team>;

    /// Applies the patch to every matching team, returning the affected count
    async fn update_all(&self, where_: Where, patch: TeamPatch) -> RepositoryResult<u64>;

    /// Updates the first match, or creates a team from the combined where and
    /// patch fields when nothing matches
    async fn upsert_with_where(&self, where_: Where, patch: TeamPatch) -> RepositoryResult<Team>;

    /// Replaces the team when the id is given and exists, otherwise creates
    async fn replace_or_create(&self, id: Option<Uuid>, data: TeamData) -> RepositoryResult<Team>;

    /// Deletes a team by id, returning the removed count (0 or 1); never
    /// cascades to members
    async fn delete(&self, id: Uuid) -> RepositoryResult<u64>;

    /// Deletes all matching teams, returning the removed count
    async fn delete_all(&self, where_: Where) -> RepositoryResult<u64>;
}
