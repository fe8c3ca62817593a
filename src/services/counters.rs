//! Denormalized counters and the rows that justify them.
//!
//! | counter                     | source rows                          |
//! |-----------------------------|--------------------------------------|
//! | `posts.likes`               | `likes` with that `post_id`          |
//! | `posts.comments_count`      | `comments` with that `post_id`       |
//! | `communities.member_count`  | `community_members` with that id     |
//! | `course_lessons.order_index`| lesson count of the file at insert   |
//!
//! The adjusters must run inside the same transaction that inserts or deletes
//! the source rows. They report a missing parent row as `NotFound` instead of
//! silently updating nothing.

use crate::error::{AppError, AppResult};
use crate::models::{comment, course_lesson, like, Comment, CourseLesson, Like, Post};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Statement,
};
use serde::Serialize;
use utoipa::ToSchema;

async fn adjust<C: ConnectionTrait>(
    conn: &C,
    sql: &str,
    column: &str,
    delta: i32,
    id: i32,
) -> AppResult<i32> {
    let row = conn
        .query_one(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            sql,
            vec![delta.into(), id.into()],
        ))
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(row.try_get("", column)?)
}

/// Adds `delta` to `posts.likes` and returns the new value.
pub async fn adjust_post_likes<C: ConnectionTrait>(
    conn: &C,
    post_id: i32,
    delta: i32,
) -> AppResult<i32> {
    adjust(
        conn,
        "UPDATE posts SET likes = likes + $1 WHERE id = $2 RETURNING likes",
        "likes",
        delta,
        post_id,
    )
    .await
}

/// Adds `delta` to `posts.comments_count` and returns the new value.
pub async fn adjust_post_comments<C: ConnectionTrait>(
    conn: &C,
    post_id: i32,
    delta: i32,
) -> AppResult<i32> {
    adjust(
        conn,
        "UPDATE posts SET comments_count = comments_count + $1 WHERE id = $2 \
         RETURNING comments_count",
        "comments_count",
        delta,
        post_id,
    )
    .await
}

/// Adds `delta` to `communities.member_count` and returns the new value.
pub async fn adjust_member_count<C: ConnectionTrait>(
    conn: &C,
    community_id: i32,
    delta: i32,
) -> AppResult<i32> {
    adjust(
        conn,
        "UPDATE communities SET member_count = member_count + $1, updated_at = NOW() \
         WHERE id = $2 RETURNING member_count",
        "member_count",
        delta,
        community_id,
    )
    .await
}

/// Index the next lesson of `file_id` receives: the current lesson count.
/// Only race-free when called inside a serializable transaction.
pub async fn next_lesson_index<C: ConnectionTrait>(conn: &C, file_id: i32) -> AppResult<i32> {
    let count = CourseLesson::find()
        .filter(course_lesson::Column::FileId.eq(file_id))
        .count(conn)
        .await?;

    i32::try_from(count)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("lesson count overflow for file {}", file_id)))
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CounterAudit {
    pub post_id: i32,
    pub stored_likes: i32,
    pub actual_likes: u64,
    pub stored_comments: i32,
    pub actual_comments: u64,
}

impl CounterAudit {
    pub fn is_consistent(&self) -> bool {
        i64::from(self.stored_likes) == self.actual_likes as i64
            && i64::from(self.stored_comments) == self.actual_comments as i64
    }
}

/// Recomputes a post's counters from its detail rows.
pub async fn audit_post<C: ConnectionTrait>(conn: &C, post_id: i32) -> AppResult<CounterAudit> {
    let post = Post::find_by_id(post_id)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)?;

    let actual_likes = Like::find()
        .filter(like::Column::PostId.eq(post_id))
        .count(conn)
        .await?;
    let actual_comments = Comment::find()
        .filter(comment::Column::PostId.eq(post_id))
        .count(conn)
        .await?;

    let audit = CounterAudit {
        post_id,
        stored_likes: post.likes,
        actual_likes,
        stored_comments: post.comments_count,
        actual_comments,
    };

    if !audit.is_consistent() {
        tracing::warn!(?audit, "Post counters drifted from detail rows");
    }

    Ok(audit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn audit(stored_likes: i32, actual_likes: u64, stored_comments: i32, actual_comments: u64) -> CounterAudit {
        CounterAudit {
            post_id: 1,
            stored_likes,
            actual_likes,
            stored_comments,
            actual_comments,
        }
    }

    #[test]
    fn matching_counts_are_consistent() {
        assert!(audit(3, 3, 0, 0).is_consistent());
    }

    #[test]
    fn like_drift_is_detected() {
        assert!(!audit(4, 3, 0, 0).is_consistent());
    }

    #[test]
    fn comment_drift_is_detected() {
        assert!(!audit(0, 0, 1, 2).is_consistent());
    }

    #[test]
    fn negative_stored_value_is_inconsistent() {
        assert!(!audit(-1, 0, 0, 0).is_consistent());
    }
}
