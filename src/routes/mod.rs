use crate::config::rate_limit::{RateLimitConfig, RateLimitRule, RouteGroup};
use crate::handlers;
use axum::{routing, Router};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

pub fn create_routes(rate_limit: &RateLimitConfig) -> Router {
    Router::new().nest("/api/v1", api_routes(rate_limit))
}

fn api_routes(config: &RateLimitConfig) -> Router {
    read_routes(config).merge(write_routes(config))
}

/// Read routes: every GET.
fn read_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        // Categories
        .route(
            "/categories",
            routing::get(handlers::category::list_categories),
        )
        // Communities
        .route(
            "/communities",
            routing::get(handlers::community::list_communities),
        )
        .route(
            "/communities/{id}",
            routing::get(handlers::community::get_community),
        )
        .route(
            "/communities/{id}/posts",
            routing::get(handlers::community::list_community_posts),
        )
        .route(
            "/communities/{id}/courses",
            routing::get(handlers::community::list_community_courses),
        )
        // Posts
        .route("/posts/{id}", routing::get(handlers::post::get_post))
        .route("/posts/{id}/likes", routing::get(handlers::like::list_likes))
        .route(
            "/posts/{id}/comments",
            routing::get(handlers::comment::list_comments),
        )
        // Users
        .route("/users/{uid}", routing::get(handlers::user::get_user))
        .route(
            "/users/{uid}/liked-posts",
            routing::get(handlers::like::list_liked_posts),
        )
        // Course files
        .route(
            "/courseFiles/course/{course_id}",
            routing::get(handlers::course_file::list_course_files),
        );

    with_optional_rate_limit(router, config.enabled, config.rule_for(RouteGroup::Read))
}

/// Write routes: creates, updates, deletes and toggles.
fn write_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        // Categories
        .route(
            "/categories",
            routing::post(handlers::category::create_category),
        )
        // Communities
        .route(
            "/communities/{id}/membership",
            routing::post(handlers::community::toggle_membership),
        )
        // Posts
        .route("/posts", routing::post(handlers::post::create_post))
        .route(
            "/posts/{id}",
            routing::put(handlers::post::update_post).delete(handlers::post::delete_post),
        )
        .route("/posts/{id}/like", routing::post(handlers::like::toggle_like))
        .route(
            "/posts/{id}/comments",
            routing::post(handlers::comment::create_comment),
        )
        // Comments
        .route(
            "/comments/{id}",
            routing::delete(handlers::comment::delete_comment),
        )
        // Users
        .route("/users", routing::post(handlers::user::upsert_user))
        // Courses
        .route("/courses", routing::post(handlers::course::create_course))
        .route(
            "/courses/{id}",
            routing::delete(handlers::course::delete_course),
        )
        // Course files
        .route(
            "/courseFiles",
            routing::post(handlers::course_file::create_course_file),
        )
        .route(
            "/courseFiles/{id}",
            routing::delete(handlers::course_file::delete_course_file),
        )
        // Lessons
        .route(
            "/courseLessons",
            routing::post(handlers::lesson::create_lesson),
        )
        .route(
            "/courseLessons/{id}",
            routing::put(handlers::lesson::update_lesson).delete(handlers::lesson::delete_lesson),
        );

    with_optional_rate_limit(router, config.enabled, config.rule_for(RouteGroup::Write))
}

fn with_optional_rate_limit(router: Router, enabled: bool, rule: RateLimitRule) -> Router {
    if !enabled {
        return router;
    }

    match GovernorConfigBuilder::default()
        .per_second(rule.per_second)
        .burst_size(rule.burst_size)
        .finish()
    {
        Some(governor_conf) => router.layer(GovernorLayer::new(governor_conf)),
        None => {
            tracing::warn!(?rule, "Invalid rate limit rule, serving without a limit");
            router
        }
    }
}
