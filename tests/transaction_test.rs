mod common;

use community_hub::config::transaction::TransactionConfig;
use community_hub::models::{course_lesson, CourseFile, CourseLesson};
use community_hub::{AppError, AppResult, Store};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter,
    Statement,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

const RAISE_SERIALIZATION_FAILURE: &str =
    "DO $$ BEGIN RAISE EXCEPTION 'forced conflict' USING ERRCODE = '40001'; END $$";

fn fast_retry(max_attempts: u32) -> TransactionConfig {
    TransactionConfig {
        max_attempts,
        attempt_timeout: Duration::from_secs(5),
        backoff_base: Duration::from_millis(1),
        backoff_max: Duration::from_millis(5),
    }
}

async fn run_sql(txn: &DatabaseTransaction, sql: &str) -> AppResult<()> {
    txn.execute(Statement::from_string(
        sea_orm::DatabaseBackend::Postgres,
        sql.to_string(),
    ))
    .await?;
    Ok(())
}

/// Raises a serialization failure on the first `failures` calls.
async fn flaky(txn: &DatabaseTransaction, calls: Arc<AtomicU32>, failures: u32) -> AppResult<u32> {
    let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
    if call <= failures {
        run_sql(txn, RAISE_SERIALIZATION_FAILURE).await?;
    }
    Ok(call)
}

async fn slow(txn: &DatabaseTransaction, calls: Arc<AtomicU32>) -> AppResult<()> {
    calls.fetch_add(1, Ordering::SeqCst);
    run_sql(txn, "SELECT pg_sleep(1)").await
}

async fn missing(calls: Arc<AtomicU32>) -> AppResult<()> {
    calls.fetch_add(1, Ordering::SeqCst);
    Err(AppError::NotFound)
}

/// Inserts `mark` into `table` `copies` times.
async fn insert_mark(
    txn: &DatabaseTransaction,
    calls: Arc<AtomicU32>,
    table: &'static str,
    mark: String,
    copies: usize,
) -> AppResult<()> {
    calls.fetch_add(1, Ordering::SeqCst);
    for _ in 0..copies {
        txn.execute(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            format!("INSERT INTO {} (mark) VALUES ($1)", table),
            vec![mark.clone().into()],
        ))
        .await?;
    }
    Ok(())
}

async fn setup_sql(store: &Store, statements: &[&str]) {
    for sql in statements {
        store
            .conn()
            .execute(Statement::from_string(
                sea_orm::DatabaseBackend::Postgres,
                sql.to_string(),
            ))
            .await
            .unwrap();
    }
}

async fn count_marks(store: &Store, table: &str, mark: &str) -> i64 {
    let row = store
        .conn()
        .query_one(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            format!("SELECT COUNT(*) FROM {} WHERE mark = $1", table),
            vec![mark.into()],
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get_by_index::<i64>(0).unwrap()
}

/// Deletes the lessons, then fails before the file goes.
async fn crash_mid_cascade(txn: &DatabaseTransaction, file_id: i32) -> AppResult<()> {
    CourseLesson::delete_many()
        .filter(course_lesson::Column::FileId.eq(file_id))
        .exec(txn)
        .await?;
    Err(AppError::Internal(anyhow::anyhow!("crash before file delete")))
}

#[tokio::test]
async fn failure_mid_cascade_leaves_file_and_lessons() {
    let app = common::spawn_app().await;
    let community_id = common::create_test_community(&app).await;
    let course_id = common::create_test_course(&app, community_id).await;
    let file_id = common::create_test_file(&app, course_id).await;
    for i in 0..3 {
        common::create_test_lesson(&app, file_id, &format!("Kept {}", i)).await;
    }

    let result = app
        .store
        .with_transaction("simulated_cascade", move |txn| {
            Box::pin(crash_mid_cascade(txn, file_id))
        })
        .await;
    assert!(matches!(result, Err(AppError::Internal(_))));

    let lessons = CourseLesson::find()
        .filter(course_lesson::Column::FileId.eq(file_id))
        .count(app.db())
        .await
        .unwrap();
    assert_eq!(lessons, 3);
    assert!(CourseFile::find_by_id(file_id)
        .one(app.db())
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn serialization_failure_is_retried_until_success() {
    let store = common::test_store(fast_retry(4)).await;
    let calls = Arc::new(AtomicU32::new(0));

    let counter = calls.clone();
    let value = store
        .with_transaction("flaky", move |txn| Box::pin(flaky(txn, counter.clone(), 2)))
        .await
        .unwrap();

    assert_eq!(value, 3);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn exhausted_retries_surface_conflict() {
    let store = common::test_store(fast_retry(3)).await;
    let calls = Arc::new(AtomicU32::new(0));

    let counter = calls.clone();
    let result = store
        .with_transaction("always_conflicts", move |txn| {
            Box::pin(flaky(txn, counter.clone(), u32::MAX))
        })
        .await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn terminal_errors_are_not_retried() {
    let store = common::test_store(fast_retry(4)).await;
    let calls = Arc::new(AtomicU32::new(0));

    let counter = calls.clone();
    let result = store
        .with_transaction("not_found", move |_txn| Box::pin(missing(counter.clone())))
        .await;

    assert!(matches!(result, Err(AppError::NotFound)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn timed_out_attempts_are_retried_then_conflict() {
    let store = common::test_store(TransactionConfig {
        max_attempts: 2,
        attempt_timeout: Duration::from_millis(50),
        backoff_base: Duration::from_millis(1),
        backoff_max: Duration::from_millis(2),
    })
    .await;
    let calls = Arc::new(AtomicU32::new(0));

    let counter = calls.clone();
    let result = store
        .with_transaction("slow", move |txn| Box::pin(slow(txn, counter.clone())))
        .await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn committed_work_is_visible_after_success() {
    let app = common::spawn_app().await;
    let community_id = common::create_test_community(&app).await;

    let count = app
        .store
        .with_transaction("bump_members", move |txn| {
            Box::pin(community_hub::services::counters::adjust_member_count(
                txn,
                community_id,
                1,
            ))
        })
        .await
        .unwrap();
    assert_eq!(count, 1);

    let stored = common::scalar(
        &app,
        "SELECT member_count::BIGINT FROM communities WHERE id = $1",
        community_id,
    )
    .await;
    assert_eq!(stored, 1);
}

#[tokio::test]
async fn slow_commit_is_not_cut_short_or_replayed() {
    let store = common::test_store(TransactionConfig {
        max_attempts: 3,
        attempt_timeout: Duration::from_millis(100),
        backoff_base: Duration::from_millis(1),
        backoff_max: Duration::from_millis(2),
    })
    .await;
    // A deferred constraint trigger makes COMMIT itself take 300ms.
    setup_sql(
        &store,
        &[
            "CREATE TABLE IF NOT EXISTS commit_latency_marks (mark TEXT NOT NULL)",
            "TRUNCATE commit_latency_marks",
            "CREATE OR REPLACE FUNCTION commit_latency_sleep() RETURNS trigger \
             LANGUAGE plpgsql AS $$ BEGIN PERFORM pg_sleep(0.3); RETURN NULL; END $$",
            "DROP TRIGGER IF EXISTS commit_latency_trigger ON commit_latency_marks",
            "CREATE CONSTRAINT TRIGGER commit_latency_trigger \
             AFTER INSERT ON commit_latency_marks DEFERRABLE INITIALLY DEFERRED \
             FOR EACH ROW EXECUTE FUNCTION commit_latency_sleep()",
        ],
    )
    .await;

    let mark = common::unique("slow-commit");
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let insert = mark.clone();
    store
        .with_transaction("slow_commit", move |txn| {
            Box::pin(insert_mark(
                txn,
                counter.clone(),
                "commit_latency_marks",
                insert.clone(),
                1,
            ))
        })
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(count_marks(&store, "commit_latency_marks", &mark).await, 1);
}

#[tokio::test]
async fn commit_failure_is_terminal() {
    let store = common::test_store(fast_retry(4)).await;
    // The duplicate is only detected at COMMIT.
    setup_sql(
        &store,
        &[
            "CREATE TABLE IF NOT EXISTS deferred_unique_marks (mark TEXT NOT NULL, \
             CONSTRAINT deferred_unique_marks_key UNIQUE (mark) DEFERRABLE INITIALLY DEFERRED)",
            "TRUNCATE deferred_unique_marks",
        ],
    )
    .await;

    let mark = common::unique("deferred");
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let insert = mark.clone();
    let result = store
        .with_transaction("deferred_duplicate", move |txn| {
            Box::pin(insert_mark(
                txn,
                counter.clone(),
                "deferred_unique_marks",
                insert.clone(),
                2,
            ))
        })
        .await;

    assert!(matches!(result, Err(AppError::Internal(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(count_marks(&store, "deferred_unique_marks", &mark).await, 0);
}
