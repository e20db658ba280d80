use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::RepositoryResult;
use crate::domain::member::{Member, MemberData, MemberPatch};
use crate::domain::query::{Filter, Where};

/// Repository trait for the Member entity
///
/// Same uniform contract as [`super::TeamRepository`]. Write operations on
/// the wired-up implementation pass through the referential-integrity gate,
/// which rejects any `teamId` that does not reference an existing team.
#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// Persists a new member and returns it with its generated id
    async fn create(&self, data: MemberData) -> RepositoryResult<Member>;

    /// Finds a member by its id
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Member>>;

    /// Checks whether a member with the given id exists; never errors on a
    /// missing id
    async fn exists(&self, id: Uuid) -> RepositoryResult<bool>;

    /// Returns all members matching the filter, empty when none match
    async fn find_all(&self, filter: Filter) -> RepositoryResult<Vec<Member>>;

    /// Returns the first member matching the filter
    async fn find_one(&self, filter: Filter) -> RepositoryResult<Option<Member>>;

    /// Counts members matching the where clause
    async fn count(&self, where_: Where) -> RepositoryResult<i64>;

    /// Merges the patch into an existing member; `NotFound` if the id is
    /// absent
    async fn update(&self, id: Uuid, patch: MemberPatch) -> RepositoryResult<Member>;

    /// Overwrites all non-id fields; `NotFound` if the id is absent
    async fn replace(&self, id: Uuid, data: MemberData) -> RepositoryResult<Member>;

    /// Applies the patch to every matching member, returning the affected
    /// count
    async fn update_all(&self, where_: Where, patch: MemberPatch) -> RepositoryResult<u64>;

    /// Updates the first match, or creates a member from the combined where
    /// and patch fields when nothing matches
    async fn upsert_with_where(&self, where_: Where, patch: MemberPatch)
        -> RepositoryResult<Member>;

    /// Replaces the member when the id is given and exists, otherwise creates
    async fn replace_or_create(
        &self,
        id: Option<Uuid>,
        data: MemberData,
    ) -> RepositoryResult<Member>;

    /// Deletes a member by id, returning the removed count (0 or 1)
    async fn delete(&self, id: Uuid) -> RepositoryResult<u64>;

    /// Deletes all matching members, returning the removed count
    async fn delete_all(&self, where_: Where) -> RepositoryResult<u64>;
}
