use axum::{
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::handlers::{self, members, relations, teams};

/// Builds the full application router
///
/// Shared by the server bootstrap and the integration tests. Static
/// segments (`count`, `findOne`, ...) are registered alongside the `:id`
/// routes; the router prefers the static match.
///
/// `get` also serves HEAD with the body stripped, which yields the
/// 200/404 existence-check contract on the single-record routes for free.
pub fn build(pool: PgPool) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Team CRUD
        .route(
            "/api/Teams",
            get(teams::list_teams)
                .post(teams::create_team)
                .patch(teams::patch_teams)
                .put(teams::replace_teams),
        )
        .route("/api/Teams/count", get(teams::count_teams))
        .route("/api/Teams/findOne", get(teams::find_one_team))
        .route("/api/Teams/replaceOrCreate", post(teams::replace_or_create_team))
        .route("/api/Teams/update", post(teams::update_teams))
        .route("/api/Teams/upsertWithWhere", post(teams::upsert_with_where_team))
        .route(
            "/api/Teams/:id",
            get(teams::get_team)
                .put(teams::put_team)
                .patch(teams::patch_team)
                .delete(teams::delete_team),
        )
        .route("/api/Teams/:id/exists", get(teams::team_exists))
        .route("/api/Teams/:id/replace", post(teams::replace_team))
        // Team -> members relation
        .route(
            "/api/Teams/:id/members",
            get(relations::list_team_members)
                .post(relations::create_team_member)
                .delete(relations::delete_team_members),
        )
        .route("/api/Teams/:id/members/count", get(relations::count_team_members))
        .route(
            "/api/Teams/:id/members/:fk",
            get(relations::get_team_member)
                .put(relations::update_team_member)
                .delete(relations::delete_team_member),
        )
        // Member CRUD
        .route(
            "/api/Members",
            get(members::list_members)
                .post(members::create_member)
                .patch(members::patch_members)
                .put(members::replace_members),
        )
        .route("/api/Members/count", get(members::count_members))
        .route("/api/Members/findOne", get(members::find_one_member))
        .route(
            "/api/Members/replaceOrCreate",
            post(members::replace_or_create_member),
        )
        .route("/api/Members/update", post(members::update_members))
        .route(
            "/api/Members/upsertWithWhere",
            post(members::upsert_with_where_member),
        )
        .route(
            "/api/Members/:id",
            get(members::get_member)
                .put(members::put_member)
                .patch(members::patch_member)
                .delete(members::delete_member),
        )
        .route("/api/Members/:id/exists", get(members::member_exists))
        .route("/api/Members/:id/replace", post(members::replace_member))
        // Member -> team relation and sibling members
        .route("/api/Members/:id/team", get(relations::get_member_team))
        .route(
            "/api/Members/:id/team/members",
            get(relations::list_sibling_members)
                .post(relations::create_sibling_member)
                .delete(relations::delete_sibling_members),
        )
        .route(
            "/api/Members/:id/team/members/count",
            get(relations::count_sibling_members),
        )
        .route(
            "/api/Members/:id/team/members/:fk",
            get(relations::get_sibling_member)
                .put(relations::update_sibling_member)
                .delete(relations::delete_sibling_member),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Shared state
        .with_state(pool)
}
