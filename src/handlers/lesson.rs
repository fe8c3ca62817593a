use crate::db::Store;
use crate::error::{AppError, AppResult};
use crate::handlers::{non_blank, required, validate};
use crate::models::CourseLessonModel;
use crate::response::ApiResponse;
use crate::services::lesson::{LessonFields, LessonService};
use axum::{extract::Path, response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLessonRequest {
    pub file_id: Option<i32>,
    #[serde(default)]
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 50))]
    pub duration: Option<String>,
    #[validate(range(min = 0))]
    pub points: Option<i32>,
    pub content: Option<String>,
    #[validate(length(max = 2048))]
    pub video_url: Option<String>,
    pub published: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLessonRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 50))]
    pub duration: Option<String>,
    #[validate(range(min = 0))]
    pub points: Option<i32>,
    pub content: Option<String>,
    #[validate(length(max = 2048))]
    pub video_url: Option<String>,
    pub published: Option<bool>,
    /// Explicit reorder; left unchanged when absent
    #[validate(range(min = 0))]
    pub order_index: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LessonResponse {
    pub id: i32,
    pub file_id: i32,
    pub title: String,
    pub duration: Option<String>,
    pub points: Option<i32>,
    pub content: Option<String>,
    pub video_url: Option<String>,
    pub order_index: i32,
    pub published: bool,
    pub created_at: String,
}

impl From<CourseLessonModel> for LessonResponse {
    fn from(l: CourseLessonModel) -> Self {
        Self {
            id: l.id,
            file_id: l.file_id,
            title: l.title,
            duration: l.duration,
            points: l.points,
            content: l.content,
            video_url: l.video_url,
            order_index: l.order_index,
            published: l.published,
            created_at: l.created_at.to_string(),
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/courseLessons",
    request_body = CreateLessonRequest,
    responses(
        (status = 201, description = "Lesson appended to the file", body = LessonResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 404, description = "File not found", body = AppError),
        (status = 409, description = "Concurrent update conflict", body = AppError),
    ),
    tag = "course-lessons"
)]
pub async fn create_lesson(
    Extension(store): Extension<Store>,
    Json(payload): Json<CreateLessonRequest>,
) -> AppResult<impl IntoResponse> {
    validate(&payload)?;
    let file_id = required(payload.file_id, "fileId")?;

    let fields = LessonFields {
        title: non_blank(&payload.title, "title")?,
        duration: payload.duration,
        points: payload.points,
        content: payload.content,
        video_url: payload.video_url,
        published: payload.published,
    };

    let service = LessonService::new(store);
    let lesson = service.create(file_id, fields).await?;

    Ok(ApiResponse::created(LessonResponse::from(lesson)))
}

#[utoipa::path(
    put,
    path = "/api/v1/courseLessons/{id}",
    params(("id" = i32, Path, description = "Lesson ID")),
    request_body = UpdateLessonRequest,
    responses(
        (status = 200, description = "Lesson updated", body = LessonResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 404, description = "Lesson not found", body = AppError),
    ),
    tag = "course-lessons"
)]
pub async fn update_lesson(
    Extension(store): Extension<Store>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateLessonRequest>,
) -> AppResult<impl IntoResponse> {
    validate(&payload)?;

    let fields = LessonFields {
        title: non_blank(&payload.title, "title")?,
        duration: payload.duration,
        points: payload.points,
        content: payload.content,
        video_url: payload.video_url,
        published: payload.published,
    };

    let service = LessonService::new(store);
    let lesson = service.update(id, fields, payload.order_index).await?;

    Ok(ApiResponse::ok(LessonResponse::from(lesson)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/courseLessons/{id}",
    params(("id" = i32, Path, description = "Lesson ID")),
    responses(
        (status = 200, description = "Lesson deleted", body = LessonResponse),
        (status = 404, description = "Lesson not found", body = AppError),
    ),
    tag = "course-lessons"
)]
pub async fn delete_lesson(
    Extension(store): Extension<Store>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = LessonService::new(store);
    let lesson = service.delete(id).await?;

    Ok(ApiResponse::ok(LessonResponse::from(lesson)))
}
