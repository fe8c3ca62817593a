use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::{like, Like, LikeModel, Post},
    services::counters,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LikeAction {
    Liked,
    Unliked,
}

#[derive(Debug, Clone, Copy)]
pub struct LikeToggle {
    pub post_id: i32,
    pub action: LikeAction,
    pub likes: i32,
}

pub struct LikeService {
    store: Store,
}

impl LikeService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Flip `user_id`'s like on `post_id` and return the resulting state.
    pub async fn toggle(&self, post_id: i32, user_id: &str) -> AppResult<LikeToggle> {
        let user_id = user_id.trim().to_string();
        if user_id.is_empty() {
            return Err(AppError::Validation("User ID is required".to_string()));
        }

        self.store
            .with_transaction("toggle_like", move |txn| {
                Box::pin(toggle_in_txn(txn, post_id, user_id.clone()))
            })
            .await
    }

    /// Likes on a post, newest first, together with the post's stored count.
    pub async fn list_by_post(&self, post_id: i32) -> AppResult<(i32, Vec<LikeModel>)> {
        let post = Post::find_by_id(post_id)
            .one(self.store.conn())
            .await?
            .ok_or(AppError::NotFound)?;

        let likes = Like::find()
            .filter(like::Column::PostId.eq(post_id))
            .order_by_desc(like::Column::CreatedAt)
            .all(self.store.conn())
            .await?;

        Ok((post.likes, likes))
    }

    pub async fn liked_post_ids(&self, user_id: &str) -> AppResult<Vec<i32>> {
        let ids = Like::find()
            .select_only()
            .column(like::Column::PostId)
            .filter(like::Column::UserId.eq(user_id))
            .order_by_desc(like::Column::CreatedAt)
            .into_tuple::<i32>()
            .all(self.store.conn())
            .await?;
        Ok(ids)
    }
}

async fn toggle_in_txn(
    txn: &DatabaseTransaction,
    post_id: i32,
    user_id: String,
) -> AppResult<LikeToggle> {
    let existing = Like::find()
        .filter(like::Column::PostId.eq(post_id))
        .filter(like::Column::UserId.eq(user_id.as_str()))
        .one(txn)
        .await?;

    let (action, delta) = match existing {
        Some(_) => (LikeAction::Unliked, -1),
        None => (LikeAction::Liked, 1),
    };

    // Counter first: a missing post fails here as NotFound rather than as a
    // foreign key violation on the like row.
    let likes = counters::adjust_post_likes(txn, post_id, delta).await?;

    match action {
        LikeAction::Unliked => {
            Like::delete_many()
                .filter(like::Column::PostId.eq(post_id))
                .filter(like::Column::UserId.eq(user_id.as_str()))
                .exec(txn)
                .await?;
        }
        LikeAction::Liked => {
            like::ActiveModel {
                post_id: Set(post_id),
                user_id: Set(user_id),
                created_at: Set(chrono::Utc::now().naive_utc()),
                ..Default::default()
            }
            .insert(txn)
            .await?;
        }
    }

    Ok(LikeToggle {
        post_id,
        action,
        likes,
    })
}
