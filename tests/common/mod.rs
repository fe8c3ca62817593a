#![allow(dead_code)]

use community_hub::config::{rate_limit::RateLimitConfig, transaction::TransactionConfig};
use community_hub::Store;
use reqwest::Client;
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::OnceCell;

static SETUP: OnceCell<()> = OnceCell::const_new();
static SEQ: AtomicUsize = AtomicUsize::new(0);

pub struct TestApp {
    pub addr: String,
    pub store: Store,
    pub client: Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.addr, path)
    }

    pub fn db(&self) -> &DatabaseConnection {
        self.store.conn()
    }
}

/// Unique suffix for names and uids within one test binary.
pub fn unique(prefix: &str) -> String {
    format!("{}_{}", prefix, SEQ.fetch_add(1, Ordering::SeqCst))
}

fn database_url() -> String {
    dotenv::dotenv().ok();
    std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"))
}

/// Retry budget roomy enough for the concurrency tests.
pub fn test_tx_config() -> TransactionConfig {
    TransactionConfig {
        max_attempts: 8,
        attempt_timeout: Duration::from_secs(5),
        backoff_base: Duration::from_millis(5),
        backoff_max: Duration::from_millis(50),
    }
}

/// Connect a fresh store, migrating and truncating once per test binary.
pub async fn test_store(tx: TransactionConfig) -> Store {
    let db = sea_orm::Database::connect(database_url())
        .await
        .expect("Failed to connect to test database");

    SETUP
        .get_or_init(|| async {
            community_hub::migration::Migrator::up(&db, None)
                .await
                .expect("Failed to run migrations");
            cleanup_tables(&db).await;
        })
        .await;

    Store::new(db, tx)
}

pub async fn spawn_app() -> TestApp {
    let store = test_store(test_tx_config()).await;

    let rate_limit = RateLimitConfig {
        enabled: false,
        ..RateLimitConfig::default()
    };

    let app = axum::Router::new()
        .route("/", axum::routing::get(|| async { "ok" }))
        .merge(community_hub::routes::create_routes(&rate_limit))
        .layer(axum::middleware::from_fn(
            community_hub::middleware::security::security_headers_middleware,
        ))
        .layer(axum::extract::Extension(store.clone()));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    TestApp {
        addr: format!("http://{}", addr),
        store,
        client: Client::new(),
    }
}

async fn cleanup_tables(db: &DatabaseConnection) {
    let tables = [
        "course_lessons",
        "course_files",
        "courses",
        "likes",
        "comments",
        "posts",
        "community_members",
        "communities",
        "categories",
        "users",
    ];

    for table in tables {
        let sql = format!("TRUNCATE TABLE {} RESTART IDENTITY CASCADE", table);
        let _ = db
            .execute(Statement::from_string(
                sea_orm::DatabaseBackend::Postgres,
                sql,
            ))
            .await;
    }
}

/// Read `data` out of a success envelope, panicking with the body otherwise.
pub async fn data(resp: reqwest::Response) -> Value {
    let status = resp.status();
    let body: Value = resp.json().await.expect("Failed to parse response");
    if !body["success"].as_bool().unwrap_or(false) {
        panic!("Request failed: status={}, body={}", status, body);
    }
    body["data"].clone()
}

/// Upsert a user and return its uid.
pub async fn create_test_user(app: &TestApp, prefix: &str) -> String {
    let uid = unique(prefix);
    let resp = app
        .client
        .post(app.url("/users"))
        .json(&json!({
            "uid": uid,
            "email": format!("{}@test.com", uid),
            "displayName": format!("User {}", uid),
        }))
        .send()
        .await
        .expect("Failed to upsert user");
    data(resp).await;
    uid
}

/// Communities have no create route; insert one directly.
pub async fn create_test_community(app: &TestApp) -> i32 {
    let row = app
        .db()
        .query_one(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            "INSERT INTO communities (name, description, type, language, member_count, created_at, updated_at) \
             VALUES ($1, 'A test community', 'public', 'en', 0, NOW(), NOW()) RETURNING id",
            vec![unique("community").into()],
        ))
        .await
        .expect("Failed to insert community")
        .expect("Insert returned no row");
    row.try_get::<i32>("", "id").expect("Missing community id")
}

pub async fn create_test_category(app: &TestApp) -> i32 {
    let resp = app
        .client
        .post(app.url("/categories"))
        .json(&json!({ "name": unique("category") }))
        .send()
        .await
        .expect("Failed to create category");
    data(resp).await["id"].as_i64().expect("Missing category id") as i32
}

pub struct SeededPost {
    pub post_id: i32,
    pub author: String,
    pub community_id: i32,
}

/// Author, community, category and one post.
pub async fn create_test_post(app: &TestApp) -> SeededPost {
    let author = create_test_user(app, "author").await;
    let community_id = create_test_community(app).await;
    let category_id = create_test_category(app).await;

    let resp = app
        .client
        .post(app.url("/posts"))
        .json(&json!({
            "authorId": author,
            "communityId": community_id,
            "categoryId": category_id,
            "title": "Test Post",
            "content": "Post content",
        }))
        .send()
        .await
        .expect("Failed to create post");
    let post_id = data(resp).await["id"].as_i64().expect("Missing post id") as i32;

    SeededPost {
        post_id,
        author,
        community_id,
    }
}

pub async fn create_test_course(app: &TestApp, community_id: i32) -> i32 {
    let resp = app
        .client
        .post(app.url("/courses"))
        .json(&json!({
            "communityId": community_id,
            "name": unique("course"),
            "type": "free",
            "level": "Beginner",
        }))
        .send()
        .await
        .expect("Failed to create course");
    data(resp).await["id"].as_i64().expect("Missing course id") as i32
}

pub async fn create_test_file(app: &TestApp, course_id: i32) -> i32 {
    let resp = app
        .client
        .post(app.url("/courseFiles"))
        .json(&json!({ "courseId": course_id, "name": unique("file") }))
        .send()
        .await
        .expect("Failed to create course file");
    data(resp).await["id"].as_i64().expect("Missing file id") as i32
}

pub async fn create_test_lesson(app: &TestApp, file_id: i32, title: &str) -> Value {
    let resp = app
        .client
        .post(app.url("/courseLessons"))
        .json(&json!({ "fileId": file_id, "title": title }))
        .send()
        .await
        .expect("Failed to create lesson");
    data(resp).await
}

/// Single-integer query, e.g. a `COUNT(*)`.
pub async fn scalar(app: &TestApp, sql: &str, id: i32) -> i64 {
    let row = app
        .db()
        .query_one(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            sql,
            vec![id.into()],
        ))
        .await
        .expect("Query failed")
        .expect("Query returned no row");
    row.try_get_by_index::<i64>(0).expect("Not an integer")
}

pub async fn post_counters(app: &TestApp, post_id: i32) -> (i64, i64) {
    let likes = scalar(app, "SELECT likes::BIGINT FROM posts WHERE id = $1", post_id).await;
    let comments = scalar(
        app,
        "SELECT comments_count::BIGINT FROM posts WHERE id = $1",
        post_id,
    )
    .await;
    (likes, comments)
}
