use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::{post, Post, PostModel},
};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, EntityTrait, FromQueryResult, Set, Statement,
};

/// Feed row: post joined with author and category name.
#[derive(Debug, Clone, FromQueryResult)]
pub struct PostSummary {
    pub id: i32,
    pub author_id: String,
    pub community_id: i32,
    pub title: String,
    pub content: String,
    pub is_pinned: bool,
    pub likes: i32,
    pub comments_count: i32,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
    pub category: Option<String>,
    pub author_email: Option<String>,
    pub author_display_name: Option<String>,
    pub author_photo_url: Option<String>,
    pub author_role: String,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: String,
    pub community_id: i32,
    pub category_id: Option<i32>,
    pub title: String,
    pub content: String,
    pub is_pinned: bool,
}

const FEED_SQL: &str = "SELECT p.id, p.author_id, p.community_id, p.title, p.content, \
    p.is_pinned, p.likes, p.comments_count, p.created_at, p.updated_at, \
    c.name AS category, \
    u.email AS author_email, u.display_name AS author_display_name, \
    u.photo_url AS author_photo_url, u.role AS author_role \
    FROM posts p \
    JOIN users u ON u.uid = p.author_id \
    LEFT JOIN categories c ON c.id = p.category_id \
    WHERE p.community_id = $1 \
    ORDER BY p.is_pinned DESC, p.created_at DESC, p.id DESC \
    LIMIT $2 OFFSET $3";

const FEED_COUNT_SQL: &str = "SELECT COUNT(*) AS count FROM posts WHERE community_id = $1";

/// `LIMIT`/`OFFSET` for a 1-based page. Pages past the addressable range
/// are a validation error.
fn feed_window(page: u64, per_page: u64) -> AppResult<(i64, i64)> {
    let out_of_range = || AppError::Validation(format!("Page {} is out of range", page));
    let limit = i64::try_from(per_page).map_err(|_| out_of_range())?;
    let offset = page
        .saturating_sub(1)
        .checked_mul(per_page)
        .and_then(|offset| i64::try_from(offset).ok())
        .ok_or_else(out_of_range)?;
    Ok((limit, offset))
}

pub struct PostService {
    store: Store,
}

impl PostService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Pinned posts first, then newest first.
    pub async fn list_by_community(
        &self,
        community_id: i32,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<PostSummary>, u64)> {
        let (limit, offset) = feed_window(page, per_page)?;

        let count_row = self
            .store
            .conn()
            .query_one(Statement::from_sql_and_values(
                sea_orm::DatabaseBackend::Postgres,
                FEED_COUNT_SQL,
                vec![community_id.into()],
            ))
            .await?
            .ok_or(AppError::Internal(anyhow::anyhow!("Count query failed")))?;
        let total: i64 = count_row.try_get_by_index(0)?;

        let posts = PostSummary::find_by_statement(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            FEED_SQL,
            vec![
                community_id.into(),
                limit.into(),
                offset.into(),
            ],
        ))
        .all(self.store.conn())
        .await?;

        Ok((posts, total.max(0) as u64))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<PostModel> {
        Post::find_by_id(id)
            .one(self.store.conn())
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn create(&self, input: NewPost) -> AppResult<PostModel> {
        let now = chrono::Utc::now().naive_utc();

        let new_post = post::ActiveModel {
            author_id: Set(input.author_id),
            community_id: Set(input.community_id),
            category_id: Set(input.category_id),
            title: Set(input.title),
            content: Set(input.content),
            is_pinned: Set(input.is_pinned),
            likes: Set(0),
            comments_count: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let post = new_post.insert(self.store.conn()).await?;
        Ok(post)
    }

    /// Counters are never touched here; only the toggle and comment
    /// operations move them.
    pub async fn update(
        &self,
        id: i32,
        content: Option<String>,
        is_pinned: Option<bool>,
    ) -> AppResult<PostModel> {
        let existing = self.get_by_id(id).await?;

        let mut active: post::ActiveModel = existing.into();
        if let Some(content) = content {
            active.content = Set(content);
        }
        if let Some(is_pinned) = is_pinned {
            active.is_pinned = Set(is_pinned);
        }
        active.updated_at = Set(chrono::Utc::now().naive_utc());

        let updated = active.update(self.store.conn()).await?;
        Ok(updated)
    }

    /// Likes and comments go with the post through `ON DELETE CASCADE`.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = Post::delete_by_id(id).exec(self.store.conn()).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}
