use crate::db::Store;
use crate::error::{AppError, AppResult};
use crate::handlers::{non_blank, required, validate};
use crate::models::{CourseLevel, CourseModel, CourseType};
use crate::response::ApiResponse;
use crate::services::course::{CourseService, DeletedCourse, NewCourse};
use axum::{extract::Path, response::IntoResponse, Extension, Json};
use sea_orm::ActiveEnum;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseRequest {
    pub community_id: Option<i32>,
    #[serde(default)]
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    /// `paid` or `free`
    #[serde(rename = "type")]
    pub course_type: Option<String>,
    /// `Beginner`, `Intermediate` or `Advanced`
    pub level: Option<String>,
    #[validate(length(max = 2048))]
    pub cover_image: Option<String>,
    pub published: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseResponse {
    pub id: i32,
    pub community_id: i32,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub course_type: Option<CourseType>,
    pub level: Option<CourseLevel>,
    pub cover_image: Option<String>,
    pub published: bool,
    pub created_at: String,
}

impl From<CourseModel> for CourseResponse {
    fn from(c: CourseModel) -> Self {
        Self {
            id: c.id,
            community_id: c.community_id,
            name: c.name,
            description: c.description,
            course_type: c.course_type,
            level: c.level,
            cover_image: c.cover_image,
            published: c.published,
            created_at: c.created_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeletedCourseResponse {
    pub course: CourseResponse,
    pub deleted_files_count: u64,
    pub deleted_lessons_count: u64,
}

impl From<DeletedCourse> for DeletedCourseResponse {
    fn from(d: DeletedCourse) -> Self {
        Self {
            course: CourseResponse::from(d.course),
            deleted_files_count: d.deleted_files,
            deleted_lessons_count: d.deleted_lessons,
        }
    }
}

/// Parse an optional enum field, rejecting values outside the allowed set.
fn parse_enum<E>(value: Option<&str>, field: &str) -> AppResult<Option<E>>
where
    E: ActiveEnum<Value = String>,
{
    match value {
        None => Ok(None),
        Some(raw) => E::try_from_value(&raw.to_string())
            .map(Some)
            .map_err(|_| AppError::Validation(format!("Invalid {}: {}", field, raw))),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/courses",
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Course created", body = CourseResponse),
        (status = 400, description = "Validation error or unknown community", body = AppError),
    ),
    tag = "courses"
)]
pub async fn create_course(
    Extension(store): Extension<Store>,
    Json(payload): Json<CreateCourseRequest>,
) -> AppResult<impl IntoResponse> {
    validate(&payload)?;

    let input = NewCourse {
        community_id: required(payload.community_id, "communityId")?,
        name: non_blank(&payload.name, "name")?,
        course_type: parse_enum::<CourseType>(payload.course_type.as_deref(), "type")?,
        level: parse_enum::<CourseLevel>(payload.level.as_deref(), "level")?,
        description: payload.description,
        cover_image: payload.cover_image,
        published: payload.published.unwrap_or(false),
    };

    let service = CourseService::new(store);
    let course = service.create(input).await?;

    Ok(ApiResponse::created(CourseResponse::from(course)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/courses/{id}",
    params(("id" = i32, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course, its files and their lessons deleted", body = DeletedCourseResponse),
        (status = 404, description = "Course not found", body = AppError),
        (status = 409, description = "Concurrent update conflict", body = AppError),
    ),
    tag = "courses"
)]
pub async fn delete_course(
    Extension(store): Extension<Store>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = CourseService::new(store);
    let deleted = service.delete(id).await?;

    Ok(ApiResponse::ok(DeletedCourseResponse::from(deleted)))
}
