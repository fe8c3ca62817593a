use axum::{extract::Extension, response::IntoResponse, routing::get, Json, Router};
use community_hub::config::{
    database::DatabaseConfig, rate_limit::RateLimitConfig, transaction::TransactionConfig,
};
use community_hub::{middleware, migration, routes, Store};
use sea_orm_migration::MigratorTrait;
use serde_json::json;
use std::env;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        // Category routes
        community_hub::handlers::category::list_categories,
        community_hub::handlers::category::create_category,
        // Community routes
        community_hub::handlers::community::list_communities,
        community_hub::handlers::community::get_community,
        community_hub::handlers::community::toggle_membership,
        community_hub::handlers::community::list_community_posts,
        community_hub::handlers::community::list_community_courses,
        // Post routes
        community_hub::handlers::post::get_post,
        community_hub::handlers::post::create_post,
        community_hub::handlers::post::update_post,
        community_hub::handlers::post::delete_post,
        // Like routes
        community_hub::handlers::like::toggle_like,
        community_hub::handlers::like::list_likes,
        community_hub::handlers::like::list_liked_posts,
        // Comment routes
        community_hub::handlers::comment::list_comments,
        community_hub::handlers::comment::create_comment,
        community_hub::handlers::comment::delete_comment,
        // User routes
        community_hub::handlers::user::upsert_user,
        community_hub::handlers::user::get_user,
        // Course routes
        community_hub::handlers::course::create_course,
        community_hub::handlers::course::delete_course,
        community_hub::handlers::course_file::list_course_files,
        community_hub::handlers::course_file::create_course_file,
        community_hub::handlers::course_file::delete_course_file,
        community_hub::handlers::lesson::create_lesson,
        community_hub::handlers::lesson::update_lesson,
        community_hub::handlers::lesson::delete_lesson,
    ),
    components(
        schemas(
            community_hub::response::ApiResponse<serde_json::Value>,
            community_hub::response::PaginatedResponse<serde_json::Value>,
            community_hub::response::PaginationQuery,
            community_hub::error::AppError,
            community_hub::models::CourseType,
            community_hub::models::CourseLevel,
            community_hub::services::like::LikeAction,
            community_hub::services::community::MembershipAction,
            community_hub::services::counters::CounterAudit,
            // Category
            community_hub::handlers::category::CategoryResponse,
            community_hub::handlers::category::CreateCategoryRequest,
            // Community
            community_hub::handlers::community::CommunityResponse,
            community_hub::handlers::community::MembershipRequest,
            community_hub::handlers::community::MembershipResponse,
            // Post
            community_hub::handlers::post::PostResponse,
            community_hub::handlers::post::PostSummaryResponse,
            community_hub::handlers::post::CreatePostRequest,
            community_hub::handlers::post::UpdatePostRequest,
            // Like
            community_hub::handlers::like::ToggleLikeRequest,
            community_hub::handlers::like::LikeToggleResponse,
            community_hub::handlers::like::LikeResponse,
            community_hub::handlers::like::LikedPostsResponse,
            // Comment
            community_hub::handlers::comment::CreateCommentRequest,
            community_hub::handlers::comment::CommentResponse,
            community_hub::handlers::comment::CommentWithAuthorResponse,
            community_hub::handlers::comment::DeletedCommentResponse,
            // User
            community_hub::handlers::user::UpsertUserRequest,
            community_hub::handlers::user::UserResponse,
            community_hub::handlers::user::AuthorResponse,
            // Course
            community_hub::handlers::course::CreateCourseRequest,
            community_hub::handlers::course::CourseResponse,
            community_hub::handlers::course::DeletedCourseResponse,
            community_hub::handlers::course_file::CreateCourseFileRequest,
            community_hub::handlers::course_file::CourseFileResponse,
            community_hub::handlers::course_file::CourseFileWithLessonsResponse,
            community_hub::handlers::course_file::DeletedCourseFileResponse,
            community_hub::handlers::lesson::CreateLessonRequest,
            community_hub::handlers::lesson::UpdateLessonRequest,
            community_hub::handlers::lesson::LessonResponse,
        )
    ),
    tags(
        (name = "categories", description = "Post categories"),
        (name = "communities", description = "Community and membership operations"),
        (name = "posts", description = "Post management operations"),
        (name = "likes", description = "Like toggling and listing"),
        (name = "comments", description = "Comment management operations"),
        (name = "users", description = "User profile operations"),
        (name = "courses", description = "Course management operations"),
        (name = "course-files", description = "Course file operations"),
        (name = "course-lessons", description = "Lesson operations"),
    )
)]
struct ApiDoc;

struct StartupConfig {
    database: DatabaseConfig,
    transaction: TransactionConfig,
    rate_limit: RateLimitConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    init_tracing();

    // Validate configuration before doing anything else
    let config = validate_config()?;

    tracing::info!("Starting Community Hub API v{}...", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        max_attempts = config.transaction.max_attempts,
        attempt_timeout_ms = config.transaction.attempt_timeout.as_millis() as u64,
        "Transaction retry policy loaded"
    );

    let store = Store::connect(&config.database, config.transaction).await?;
    tracing::info!("Database connected successfully");

    migration::Migrator::up(store.conn(), None).await?;
    tracing::info!("Database migrations applied successfully");

    let app = create_app(&config.rate_limit).layer(Extension(store.clone()));

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    store.close().await?;
    tracing::info!("Server shut down gracefully");
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "community_hub=debug,tower_http=debug,axum=debug".into());

    let json_output = env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json_output {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Validate all required configuration at startup (fail-fast).
fn validate_config() -> anyhow::Result<StartupConfig> {
    let database = DatabaseConfig::from_env()?;
    let transaction = TransactionConfig::from_env();
    let rate_limit = RateLimitConfig::from_env();

    if !rate_limit.enabled {
        tracing::warn!("Rate limiting disabled");
    }

    Ok(StartupConfig {
        database,
        transaction,
        rate_limit,
    })
}

fn build_cors_layer() -> CorsLayer {
    use axum::http::{header, HeaderValue, Method};

    let origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE]);

    if origins_str == "*" {
        cors.allow_origin(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = origins_str
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

fn create_app(rate_limit: &RateLimitConfig) -> Router {
    Router::new()
        .route("/", get(health_check))
        .merge(routes::create_routes(rate_limit))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(axum::middleware::from_fn(
            middleware::security::security_headers_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Health check successful", body = serde_json::Value)
    )
)]
async fn health_check(Extension(store): Extension<Store>) -> impl IntoResponse {
    let db_ok = store.ping().await;
    let status = if db_ok { "ok" } else { "degraded" };

    Json(json!({
        "status": status,
        "service": "Community Hub API",
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_ok,
    }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, gracefully shutting down...");
}
