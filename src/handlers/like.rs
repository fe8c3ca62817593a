use crate::db::Store;
use crate::error::{AppError, AppResult};
use crate::handlers::validate;
use crate::models::LikeModel;
use crate::response::ApiResponse;
use crate::services::like::{LikeAction, LikeService, LikeToggle};
use axum::{extract::Path, response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToggleLikeRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 128))]
    pub user_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikeToggleResponse {
    pub post_id: i32,
    /// `liked` or `unliked`
    pub action: LikeAction,
    /// Like count after the toggle
    pub likes: i32,
}

impl From<LikeToggle> for LikeToggleResponse {
    fn from(t: LikeToggle) -> Self {
        Self {
            post_id: t.post_id,
            action: t.action,
            likes: t.likes,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub id: i32,
    pub user_id: String,
    pub created_at: String,
    /// The post's stored like count
    pub total_likes: i32,
}

impl LikeResponse {
    fn new(like: LikeModel, total_likes: i32) -> Self {
        Self {
            id: like.id,
            user_id: like.user_id,
            created_at: like.created_at.to_string(),
            total_likes,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikedPostsResponse {
    pub uid: String,
    pub post_ids: Vec<i32>,
}

#[utoipa::path(
    post,
    path = "/api/v1/posts/{id}/like",
    params(("id" = i32, Path, description = "Post ID")),
    request_body = ToggleLikeRequest,
    responses(
        (status = 200, description = "Like toggled", body = LikeToggleResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 404, description = "Post not found", body = AppError),
        (status = 409, description = "Concurrent update conflict", body = AppError),
    ),
    tag = "likes"
)]
pub async fn toggle_like(
    Extension(store): Extension<Store>,
    Path(id): Path<i32>,
    Json(payload): Json<ToggleLikeRequest>,
) -> AppResult<impl IntoResponse> {
    validate(&payload)?;

    let service = LikeService::new(store);
    let toggle = service.toggle(id, &payload.user_id).await?;

    Ok(ApiResponse::ok(LikeToggleResponse::from(toggle)))
}

#[utoipa::path(
    get,
    path = "/api/v1/posts/{id}/likes",
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Likes on the post, newest first", body = Vec<LikeResponse>),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "likes"
)]
pub async fn list_likes(
    Extension(store): Extension<Store>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = LikeService::new(store);
    let (total_likes, likes) = service.list_by_post(id).await?;

    let items: Vec<LikeResponse> = likes
        .into_iter()
        .map(|l| LikeResponse::new(l, total_likes))
        .collect();
    Ok(ApiResponse::ok(items))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{uid}/liked-posts",
    params(("uid" = String, Path, description = "User uid")),
    responses(
        (status = 200, description = "Ids of posts the user likes", body = LikedPostsResponse),
    ),
    tag = "likes"
)]
pub async fn list_liked_posts(
    Extension(store): Extension<Store>,
    Path(uid): Path<String>,
) -> AppResult<impl IntoResponse> {
    let service = LikeService::new(store);
    let post_ids = service.liked_post_ids(&uid).await?;

    Ok(ApiResponse::ok(LikedPostsResponse { uid, post_ids }))
}
