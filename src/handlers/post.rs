use crate::db::Store;
use crate::error::{AppError, AppResult};
use crate::handlers::user::AuthorResponse;
use crate::handlers::{non_blank, required, validate};
use crate::models::PostModel;
use crate::response::ApiResponse;
use crate::services::post::{NewPost, PostService, PostSummary};
use axum::{extract::Path, response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    /// Author uid
    #[serde(default)]
    #[validate(length(min = 1, max = 128))]
    pub author_id: String,
    pub community_id: Option<i32>,
    pub category_id: Option<i32>,
    /// Post title (1-200 characters)
    #[serde(default)]
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub content: String,
    pub is_pinned: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    #[validate(length(min = 1))]
    pub content: Option<String>,
    pub is_pinned: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: i32,
    pub author_id: String,
    pub community_id: i32,
    pub category_id: Option<i32>,
    pub title: String,
    pub content: String,
    pub is_pinned: bool,
    /// Number of users currently liking the post
    pub likes: i32,
    /// Number of live comments
    pub comments_count: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<PostModel> for PostResponse {
    fn from(p: PostModel) -> Self {
        Self {
            id: p.id,
            author_id: p.author_id,
            community_id: p.community_id,
            category_id: p.category_id,
            title: p.title,
            content: p.content,
            is_pinned: p.is_pinned,
            likes: p.likes,
            comments_count: p.comments_count,
            created_at: p.created_at.to_string(),
            updated_at: p.updated_at.to_string(),
        }
    }
}

/// Feed entry: a post with its author and category name.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostSummaryResponse {
    pub id: i32,
    pub community_id: i32,
    pub title: String,
    pub content: String,
    pub is_pinned: bool,
    pub likes: i32,
    pub comments_count: i32,
    pub category: Option<String>,
    pub author: AuthorResponse,
    pub created_at: String,
    pub updated_at: String,
}

impl From<PostSummary> for PostSummaryResponse {
    fn from(p: PostSummary) -> Self {
        Self {
            id: p.id,
            community_id: p.community_id,
            title: p.title,
            content: p.content,
            is_pinned: p.is_pinned,
            likes: p.likes,
            comments_count: p.comments_count,
            category: p.category,
            author: AuthorResponse {
                uid: p.author_id,
                email: p.author_email,
                display_name: p.author_display_name,
                photo_url: p.author_photo_url,
                role: p.author_role,
            },
            created_at: p.created_at.to_string(),
            updated_at: p.updated_at.to_string(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/posts/{id}",
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post details", body = PostResponse),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "posts"
)]
pub async fn get_post(
    Extension(store): Extension<Store>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = PostService::new(store);
    let post = service.get_by_id(id).await?;
    Ok(ApiResponse::ok(PostResponse::from(post)))
}

#[utoipa::path(
    post,
    path = "/api/v1/posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = PostResponse),
        (status = 400, description = "Validation error or unknown community/category/author", body = AppError),
    ),
    tag = "posts"
)]
pub async fn create_post(
    Extension(store): Extension<Store>,
    Json(payload): Json<CreatePostRequest>,
) -> AppResult<impl IntoResponse> {
    validate(&payload)?;

    let input = NewPost {
        author_id: non_blank(&payload.author_id, "authorId")?,
        community_id: required(payload.community_id, "communityId")?,
        category_id: Some(required(payload.category_id, "categoryId")?),
        title: non_blank(&payload.title, "title")?,
        content: non_blank(&payload.content, "content")?,
        is_pinned: payload.is_pinned.unwrap_or(false),
    };

    let service = PostService::new(store);
    let post = service.create(input).await?;

    Ok(ApiResponse::created(PostResponse::from(post)))
}

#[utoipa::path(
    put,
    path = "/api/v1/posts/{id}",
    params(("id" = i32, Path, description = "Post ID")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Post updated", body = PostResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "posts"
)]
pub async fn update_post(
    Extension(store): Extension<Store>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdatePostRequest>,
) -> AppResult<impl IntoResponse> {
    validate(&payload)?;
    if payload.content.is_none() && payload.is_pinned.is_none() {
        return Err(AppError::Validation(
            "Provide content or isPinned to update".to_string(),
        ));
    }

    let content = match payload.content.as_deref() {
        Some(content) => Some(non_blank(content, "content")?),
        None => None,
    };

    let service = PostService::new(store);
    let post = service.update(id, content, payload.is_pinned).await?;

    Ok(ApiResponse::ok(PostResponse::from(post)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/posts/{id}",
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post deleted", body = String),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "posts"
)]
pub async fn delete_post(
    Extension(store): Extension<Store>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = PostService::new(store);
    service.delete(id).await?;

    Ok(ApiResponse::ok("Post deleted"))
}
