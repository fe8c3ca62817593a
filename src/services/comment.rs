use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::{comment, Comment, CommentModel},
    services::counters,
};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, FromQueryResult, Set,
    Statement,
};

/// Comment row joined with its author; author columns are absent when the
/// author has no `users` row.
#[derive(Debug, Clone, FromQueryResult)]
pub struct CommentWithAuthor {
    pub id: i32,
    pub post_id: i32,
    pub author_id: String,
    pub content: String,
    pub parent_comment_id: Option<i32>,
    pub created_at: chrono::NaiveDateTime,
    pub author_uid: Option<String>,
    pub author_email: Option<String>,
    pub author_display_name: Option<String>,
    pub author_photo_url: Option<String>,
    pub author_role: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub author_id: String,
    pub content: String,
    pub parent_comment_id: Option<i32>,
}

#[derive(Debug, Clone, Copy)]
pub struct DeletedComment {
    pub id: i32,
    pub post_id: i32,
    /// The comment plus every reply beneath it.
    pub removed: u64,
    pub comments_count: i32,
}

const LIST_BY_POST_SQL: &str = "SELECT c.id, c.post_id, c.author_id, c.content, \
    c.parent_comment_id, c.created_at, \
    u.uid AS author_uid, u.email AS author_email, u.display_name AS author_display_name, \
    u.photo_url AS author_photo_url, u.role AS author_role \
    FROM comments c \
    LEFT JOIN users u ON u.uid = c.author_id \
    WHERE c.post_id = $1 \
    ORDER BY c.created_at DESC, c.id DESC";

const DELETE_SUBTREE_SQL: &str = "WITH RECURSIVE subtree AS ( \
        SELECT id FROM comments WHERE id = $1 \
        UNION ALL \
        SELECT c.id FROM comments c JOIN subtree s ON c.parent_comment_id = s.id \
    ) \
    DELETE FROM comments WHERE id IN (SELECT id FROM subtree)";

pub struct CommentService {
    store: Store,
}

impl CommentService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn list_by_post(&self, post_id: i32) -> AppResult<Vec<CommentWithAuthor>> {
        let comments = CommentWithAuthor::find_by_statement(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            LIST_BY_POST_SQL,
            vec![post_id.into()],
        ))
        .all(self.store.conn())
        .await?;
        Ok(comments)
    }

    /// Insert a comment and bump the post's `comments_count` as one unit.
    pub async fn add(&self, post_id: i32, input: NewComment) -> AppResult<CommentModel> {
        let input = NewComment {
            author_id: input.author_id.trim().to_string(),
            content: input.content.trim().to_string(),
            parent_comment_id: input.parent_comment_id,
        };
        if input.author_id.is_empty() || input.content.is_empty() {
            return Err(AppError::Validation(
                "Author ID and content are required".to_string(),
            ));
        }

        self.store
            .with_transaction("add_comment", move |txn| {
                Box::pin(add_in_txn(txn, post_id, input.clone()))
            })
            .await
    }

    /// Delete a comment with its replies and decrement the post's counter.
    pub async fn delete(&self, id: i32) -> AppResult<DeletedComment> {
        self.store
            .with_transaction("delete_comment", move |txn| {
                Box::pin(delete_in_txn(txn, id))
            })
            .await
    }
}

async fn add_in_txn(
    txn: &DatabaseTransaction,
    post_id: i32,
    input: NewComment,
) -> AppResult<CommentModel> {
    if let Some(parent_id) = input.parent_comment_id {
        let parent = Comment::find_by_id(parent_id)
            .one(txn)
            .await?
            .ok_or_else(|| AppError::Validation("Parent comment not found".to_string()))?;

        if parent.post_id != post_id {
            return Err(AppError::Validation(
                "Parent comment belongs to a different post".to_string(),
            ));
        }
    }

    counters::adjust_post_comments(txn, post_id, 1).await?;

    let comment = comment::ActiveModel {
        post_id: Set(post_id),
        author_id: Set(input.author_id),
        content: Set(input.content),
        parent_comment_id: Set(input.parent_comment_id),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    Ok(comment)
}

async fn delete_in_txn(txn: &DatabaseTransaction, id: i32) -> AppResult<DeletedComment> {
    let existing = Comment::find_by_id(id)
        .one(txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let removed = txn
        .execute(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            DELETE_SUBTREE_SQL,
            vec![id.into()],
        ))
        .await?
        .rows_affected();

    let delta = i32::try_from(removed)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("comment subtree too large")))?;
    let comments_count = counters::adjust_post_comments(txn, existing.post_id, -delta).await?;

    Ok(DeletedComment {
        id,
        post_id: existing.post_id,
        removed,
        comments_count,
    })
}

