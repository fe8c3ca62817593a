use crate::db::Store;
use crate::error::{AppError, AppResult};
use crate::handlers::user::AuthorResponse;
use crate::handlers::validate;
use crate::models::CommentModel;
use crate::response::ApiResponse;
use crate::services::comment::{CommentService, CommentWithAuthor, DeletedComment, NewComment};
use crate::services::post::PostService;
use axum::{extract::Path, response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 128))]
    pub author_id: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 10000))]
    pub content: String,
    /// Reply target; must belong to the same post
    pub parent_comment_id: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: i32,
    pub post_id: i32,
    pub author_id: String,
    pub content: String,
    pub created_at: String,
    pub parent_comment_id: Option<i32>,
}

impl From<CommentModel> for CommentResponse {
    fn from(c: CommentModel) -> Self {
        Self {
            id: c.id,
            post_id: c.post_id,
            author_id: c.author_id,
            content: c.content,
            created_at: c.created_at.to_string(),
            parent_comment_id: c.parent_comment_id,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentWithAuthorResponse {
    pub id: i32,
    pub post_id: i32,
    pub author_id: String,
    pub content: String,
    pub created_at: String,
    pub parent_comment_id: Option<i32>,
    /// Absent when the author has no user row
    pub author: Option<AuthorResponse>,
}

impl From<CommentWithAuthor> for CommentWithAuthorResponse {
    fn from(c: CommentWithAuthor) -> Self {
        let author = c.author_uid.map(|uid| AuthorResponse {
            uid,
            email: c.author_email,
            display_name: c.author_display_name,
            photo_url: c.author_photo_url,
            role: c.author_role.unwrap_or_default(),
        });
        Self {
            id: c.id,
            post_id: c.post_id,
            author_id: c.author_id,
            content: c.content,
            created_at: c.created_at.to_string(),
            parent_comment_id: c.parent_comment_id,
            author,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeletedCommentResponse {
    pub id: i32,
    pub post_id: i32,
    /// The comment plus its replies
    pub deleted_count: u64,
    /// The post's comment count after the delete
    pub comments_count: i32,
}

impl From<DeletedComment> for DeletedCommentResponse {
    fn from(d: DeletedComment) -> Self {
        Self {
            id: d.id,
            post_id: d.post_id,
            deleted_count: d.removed,
            comments_count: d.comments_count,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/posts/{id}/comments",
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Comments, newest first", body = Vec<CommentWithAuthorResponse>),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "comments"
)]
pub async fn list_comments(
    Extension(store): Extension<Store>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    PostService::new(store.clone()).get_by_id(id).await?;

    let service = CommentService::new(store);
    let comments = service.list_by_post(id).await?;

    let items: Vec<CommentWithAuthorResponse> = comments
        .into_iter()
        .map(CommentWithAuthorResponse::from)
        .collect();
    Ok(ApiResponse::ok(items))
}

#[utoipa::path(
    post,
    path = "/api/v1/posts/{id}/comments",
    params(("id" = i32, Path, description = "Post ID")),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment created", body = CommentResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 404, description = "Post not found", body = AppError),
        (status = 409, description = "Concurrent update conflict", body = AppError),
    ),
    tag = "comments"
)]
pub async fn create_comment(
    Extension(store): Extension<Store>,
    Path(id): Path<i32>,
    Json(payload): Json<CreateCommentRequest>,
) -> AppResult<impl IntoResponse> {
    validate(&payload)?;

    let service = CommentService::new(store);
    let comment = service
        .add(
            id,
            NewComment {
                author_id: payload.author_id,
                content: payload.content,
                parent_comment_id: payload.parent_comment_id,
            },
        )
        .await?;

    Ok(ApiResponse::created(CommentResponse::from(comment)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/comments/{id}",
    params(("id" = i32, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment and replies deleted", body = DeletedCommentResponse),
        (status = 404, description = "Comment not found", body = AppError),
        (status = 409, description = "Concurrent update conflict", body = AppError),
    ),
    tag = "comments"
)]
pub async fn delete_comment(
    Extension(store): Extension<Store>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = CommentService::new(store);
    let deleted = service.delete(id).await?;

    Ok(ApiResponse::ok(DeletedCommentResponse::from(deleted)))
}
