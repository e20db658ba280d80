//! Integration tests for the repository layer
//!
//! These tests verify that the PostgreSQL repository implementations and the
//! gated member repository interact correctly with the database: CRUD
//! operations, dynamic filters, and the referential-integrity gate.
//!
//! Requires DATABASE_URL pointing at a PostgreSQL instance with the
//! migrations applied.

use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use teamdir_api::domain::errors::RepositoryError;
use teamdir_api::domain::gate::GatedMemberRepository;
use teamdir_api::domain::member::{MemberData, MemberPatch};
use teamdir_api::domain::query::{Filter, Where};
use teamdir_api::domain::repositories::{MemberRepository, TeamRepository};
use teamdir_api::domain::team::{TeamData, TeamPatch};
use teamdir_api::infrastructure::repositories::{
    PostgresMemberRepository, PostgresTeamRepository,
};

/// Set up test database connection pool
async fn setup_test_db() -> PgPool {
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");

    PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test database")
}

fn team_repo(pool: &PgPool) -> PostgresTeamRepository {
    PostgresTeamRepository::new(pool.clone())
}

fn member_repo(
    pool: &PgPool,
) -> GatedMemberRepository<PostgresMemberRepository, PostgresTeamRepository> {
    GatedMemberRepository::new(
        PostgresMemberRepository::new(pool.clone()),
        PostgresTeamRepository::new(pool.clone()),
    )
}

fn team_data(name: &str) -> TeamData {
    TeamData {
        name: name.to_string(),
        description: Some("repository test team".to_string()),
    }
}

fn member_data(name: &str, team_id: Option<Uuid>) -> MemberData {
    MemberData {
        name: name.to_string(),
        role: "member".to_string(),
        team_id,
    }
}

async fn cleanup_team(pool: &PgPool, id: Uuid) {
    sqlx::query("DELETE FROM teams WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .expect("Failed to cleanup team");
}

async fn cleanup_member(pool: &PgPool, id: Uuid) {
    sqlx::query("DELETE FROM members WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .expect("Failed to cleanup member");
}

#[tokio::test]
async fn test_team_create_and_find_round_trip() {
    let pool = setup_test_db().await;
    let repo = team_repo(&pool);

    let created = repo
        .create(team_data("Round Trip"))
        .await
        .expect("Failed to create team");

    let found = repo
        .find_by_id(created.id())
        .await
        .expect("Failed to find team")
        .expect("Team should exist");

    assert_eq!(found, created);
    assert_eq!(found.name(), "Round Trip");
    assert_eq!(found.description(), Some("repository test team"));

    cleanup_team(&pool, created.id()).await;
}

#[tokio::test]
async fn test_team_exists_and_delete_counts() {
    let pool = setup_test_db().await;
    let repo = team_repo(&pool);

    let team = repo.create(team_data("Fleeting")).await.unwrap();

    assert!(repo.exists(team.id()).await.unwrap());
    assert_eq!(repo.delete(team.id()).await.unwrap(), 1);
    assert!(!repo.exists(team.id()).await.unwrap());

    // Second delete affects zero rows rather than erroring
    assert_eq!(repo.delete(team.id()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_team_update_merges_fields() {
    let pool = setup_test_db().await;
    let repo = team_repo(&pool);

    let team = repo.create(team_data("Before Update")).await.unwrap();

    let updated = repo
        .update(
            team.id(),
            TeamPatch {
                name: Some("After Update".to_string()),
                description: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.id(), team.id());
    assert_eq!(updated.name(), "After Update");
    // Untouched field survives the patch
    assert_eq!(updated.description(), team.description());

    cleanup_team(&pool, team.id()).await;
}

#[tokio::test]
async fn test_team_update_missing_id_is_not_found() {
    let pool = setup_test_db().await;
    let repo = team_repo(&pool);

    let result = repo
        .update(
            Uuid::new_v4(),
            TeamPatch {
                name: Some("Ghost".to_string()),
                description: None,
            },
        )
        .await;

    assert!(matches!(result, Err(RepositoryError::NotFound(_))));
}

#[tokio::test]
async fn test_team_find_all_with_filter_and_order() {
    let pool = setup_test_db().await;
    let repo = team_repo(&pool);

    let marker = format!("filter-{}", Uuid::new_v4());
    let first = repo
        .create(TeamData {
            name: marker.clone(),
            description: Some("a".to_string()),
        })
        .await
        .unwrap();
    let second = repo
        .create(TeamData {
            name: marker.clone(),
            description: Some("b".to_string()),
        })
        .await
        .unwrap();

    let filter = Filter::from_json(&format!(
        r#"{{"where": {{"name": "{}"}}, "order": "description DESC"}}"#,
        marker
    ))
    .unwrap();

    let teams = repo.find_all(filter).await.unwrap();

    assert_eq!(teams.len(), 2);
    assert_eq!(teams[0].description(), Some("b"));
    assert_eq!(teams[1].description(), Some("a"));

    let count = repo
        .count(Where::from_json(&format!(r#"{{"name": "{}"}}"#, marker)).unwrap())
        .await
        .unwrap();
    assert_eq!(count, 2);

    cleanup_team(&pool, first.id()).await;
    cleanup_team(&pool, second.id()).await;
}

#[tokio::test]
async fn test_gated_create_rejects_dangling_team() {
    let pool = setup_test_db().await;
    let repo = member_repo(&pool);

    let missing = Uuid::new_v4();
    let result = repo.create(member_data("Rejected", Some(missing))).await;

    match result {
        Err(RepositoryError::Validation(message)) => {
            assert_eq!(message, format!("Team with id {} does not exist.", missing));
        }
        other => panic!("Expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_gated_create_accepts_existing_team() {
    let pool = setup_test_db().await;
    let teams = team_repo(&pool);
    let members = member_repo(&pool);

    let team = teams.create(team_data("Gate Pass")).await.unwrap();
    let member = members
        .create(member_data("Accepted", Some(team.id())))
        .await
        .unwrap();

    assert_eq!(member.team_id(), Some(team.id()));

    cleanup_member(&pool, member.id()).await;
    cleanup_team(&pool, team.id()).await;
}

#[tokio::test]
async fn test_gated_update_all_batches_the_team_lookup() {
    let pool = setup_test_db().await;
    let teams = team_repo(&pool);
    let members = member_repo(&pool);

    let source = teams.create(team_data("Source Team")).await.unwrap();
    let target = teams.create(team_data("Target Team")).await.unwrap();

    let a = members
        .create(member_data("Mover A", Some(source.id())))
        .await
        .unwrap();
    let b = members
        .create(member_data("Mover B", Some(source.id())))
        .await
        .unwrap();

    // Move everyone in one statement; the gate validates the target once
    let mut where_ = Where::new();
    where_.set("teamId", json!(source.id().to_string()));
    let patch: MemberPatch =
        serde_json::from_value(json!({ "teamId": target.id() })).unwrap();

    let moved = members.update_all(where_, patch).await.unwrap();
    assert_eq!(moved, 2);

    let mut target_where = Where::new();
    target_where.set("teamId", json!(target.id().to_string()));
    assert_eq!(members.count(target_where).await.unwrap(), 2);

    cleanup_member(&pool, a.id()).await;
    cleanup_member(&pool, b.id()).await;
    cleanup_team(&pool, source.id()).await;
    cleanup_team(&pool, target.id()).await;
}

#[tokio::test]
async fn test_member_delete_all_by_team() {
    let pool = setup_test_db().await;
    let teams = team_repo(&pool);
    let members = member_repo(&pool);

    let team = teams.create(team_data("Emptied Team")).await.unwrap();
    members
        .create(member_data("Gone A", Some(team.id())))
        .await
        .unwrap();
    members
        .create(member_data("Gone B", Some(team.id())))
        .await
        .unwrap();

    let mut where_ = Where::new();
    where_.set("teamId", json!(team.id().to_string()));

    let removed = members.delete_all(where_.clone()).await.unwrap();
    assert_eq!(removed, 2);
    assert_eq!(members.count(where_).await.unwrap(), 0);

    cleanup_team(&pool, team.id()).await;
}

#[tokio::test]
async fn test_team_delete_leaves_dangling_reference() {
    let pool = setup_test_db().await;
    let teams = team_repo(&pool);
    let members = member_repo(&pool);

    let team = teams.create(team_data("Doomed")).await.unwrap();
    let member = members
        .create(member_data("Orphan", Some(team.id())))
        .await
        .unwrap();

    assert_eq!(teams.delete(team.id()).await.unwrap(), 1);

    // The member row is untouched and still points at the dead team
    let orphan = members
        .find_by_id(member.id())
        .await
        .unwrap()
        .expect("Member should survive its team");
    assert_eq!(orphan.team_id(), Some(team.id()));

    cleanup_member(&pool, member.id()).await;
}

#[tokio::test]
async fn test_member_replace_or_create_keeps_supplied_id() {
    let pool = setup_test_db().await;
    let members = member_repo(&pool);

    let supplied = Uuid::new_v4();
    let created = members
        .replace_or_create(Some(supplied), member_data("Keeper", None))
        .await
        .unwrap();

    assert_eq!(created.id(), supplied);

    // Same id again: replaces instead of creating
    let replaced = members
        .replace_or_create(
            Some(supplied),
            MemberData {
                name: "Keeper".to_string(),
                role: "replaced".to_string(),
                team_id: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(replaced.id(), supplied);
    assert_eq!(replaced.role(), "replaced");
    assert_eq!(members.count(Where::new()).await.unwrap() >= 1, true);

    cleanup_member(&pool, supplied).await;
}

#[tokio::test]
async fn test_member_upsert_with_where_create_path() {
    let pool = setup_test_db().await;
    let teams = team_repo(&pool);
    let members = member_repo(&pool);

    let team = teams.create(team_data("Upsert Home")).await.unwrap();
    let marker = format!("upserted-{}", Uuid::new_v4());

    let mut where_ = Where::new();
    where_.set("name", json!(marker.clone()));
    where_.set("teamId", json!(team.id().to_string()));

    let patch: MemberPatch = serde_json::from_value(json!({ "role": "recruit" })).unwrap();

    let created = members.upsert_with_where(where_, patch).await.unwrap();

    assert_eq!(created.name(), marker);
    assert_eq!(created.role(), "recruit");
    assert_eq!(created.team_id(), Some(team.id()));

    cleanup_member(&pool, created.id()).await;
    cleanup_team(&pool, team.id()).await;
}
