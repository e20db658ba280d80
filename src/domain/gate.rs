use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::{RepositoryError, RepositoryResult};
use crate::domain::member::{Member, MemberData, MemberPatch};
use crate::domain::query::{Filter, Where};
use crate::domain::repositories::{MemberRepository, TeamRepository};

/// Referential-integrity gate for the member -> team foreign key
///
/// Holds an explicit handle to the team repository and checks, synchronously
/// before every member write, that a supplied `teamId` references an existing
/// team. Performs no writes of its own.
///
/// The lookup and the subsequent member write are two separate round-trips
/// with no transaction around them: a team deleted in between yields a
/// dangling reference, not an error.
pub struct TeamRefGate<T> {
    teams: T,
}

impl<T: TeamRepository> TeamRefGate<T> {
    pub fn new(teams: T) -> Self {
        Self { teams }
    }

    /// Allows the write when `team_id` is absent; otherwise requires the
    /// referenced team to exist
    ///
    /// Datastore failures during the lookup propagate unchanged.
    pub async fn check(&self, team_id: Option<Uuid>) -> RepositoryResult<()> {
        let Some(team_id) = team_id else {
            return Ok(());
        };

        match self.teams.find_by_id(team_id).await? {
            Some(_) => Ok(()),
            None => Err(RepositoryError::Validation(format!(
                "Team with id {} does not exist.",
                team_id
            ))),
        }
    }
}

/// Member repository decorator that runs the gate before every write
///
/// Reads delegate untouched. Each write path extracts the candidate `teamId`
/// (from the full payload, the patch, or the upsert where clause) and runs
/// [`TeamRefGate::check`] exactly once before delegating to the inner
/// repository.
pub struct GatedMemberRepository<M, T> {
    inner: M,
    gate: TeamRefGate<T>,
}

impl<M, T> GatedMemberRepository<M, T>
where
    M: MemberRepository,
    T: TeamRepository,
{
    pub fn new(inner: M, teams: T) -> Self {
        Self {
            inner,
            gate: TeamRefGate::new(teams),
        }
    }
}

/// Pulls a candidate team id out of a where clause, for the upsert path
/// where a created record inherits the clause's fields
fn where_team_id(where_: &Where) -> Option<Uuid> {
    where_
        .get("teamId")
        .and_then(|value| value.as_str())
        .and_then(|raw| Uuid::parse_str(raw).ok())
}

#[async_trait]
impl<M, T> MemberRepository for GatedMemberRepository<M, T>
where
    M: MemberRepository,
    T: TeamRepository,
{
    async fn create(&self, data: MemberData) -> RepositoryResult<Member> {
        self.gate.check(data.team_id).await?;
        self.inner.create(data).await
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Member>> {
        self.inner.find_by_id(id).await
    }

    async fn exists(&self, id: Uuid) -> RepositoryResult<bool> {
        self.inner.exists(id).await
    }

    async fn find_all(&self, filter: Filter) -> RepositoryResult<Vec<Member>> {
        self.inner.find_all(filter).await
    }

    async fn find_one(&self, filter: Filter) -> RepositoryResult<Option<Member>> {
        self.inner.find_one(filter).await
    }

    async fn count(&self, where_: Where) -> RepositoryResult<i64> {
        self.inner.count(where_).await
    }

    async fn update(&self, id: Uuid, patch: MemberPatch) -> RepositoryResult<Member> {
        self.gate.check(patch.team_id.flatten()).await?;
        self.inner.update(id, patch).await
    }

    async fn replace(&self, id: Uuid, data: MemberData) -> RepositoryResult<Member> {
        self.gate.check(data.team_id).await?;
        self.inner.replace(id, data).await
    }

    async fn update_all(&self, where_: Where, patch: MemberPatch) -> RepositoryResult<u64> {
        // One lookup covers every affected row since the patch carries at
        // most one target teamId
        self.gate.check(patch.team_id.flatten()).await?;
        self.inner.update_all(where_, patch).await
    }

    async fn upsert_with_where(
        &self,
        where_: Where,
        patch: MemberPatch,
    ) -> RepositoryResult<Member> {
        // Same merge the repository applies: an explicit null in the patch
        // wins over the where clause and clears the association
        let candidate = match patch.team_id {
            Some(explicit) => explicit,
            None => where_team_id(&where_),
        };
        self.gate.check(candidate).await?;
        self.inner.upsert_with_where(where_, patch).await
    }

    async fn replace_or_create(
        &self,
        id: Option<Uuid>,
        data: MemberData,
    ) -> RepositoryResult<Member> {
        self.gate.check(data.team_id).await?;
        self.inner.replace_or_create(id, data).await
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<u64> {
        self.inner.delete(id).await
    }

    async fn delete_all(&self, where_: Where) -> RepositoryResult<u64> {
        self.inner.delete_all(where_).await
    }
}
