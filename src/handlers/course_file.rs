use crate::db::Store;
use crate::error::{AppError, AppResult};
use crate::handlers::lesson::LessonResponse;
use crate::handlers::{non_blank, required, validate};
use crate::models::{CourseFileModel, CourseLessonModel};
use crate::response::ApiResponse;
use crate::services::course_file::{CourseFileService, DeletedCourseFile};
use axum::{extract::Path, response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseFileRequest {
    pub course_id: Option<i32>,
    #[serde(default)]
    #[validate(length(min = 1, max = 200))]
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseFileResponse {
    pub id: i32,
    pub course_id: i32,
    pub name: String,
    pub created_at: String,
}

impl From<CourseFileModel> for CourseFileResponse {
    fn from(f: CourseFileModel) -> Self {
        Self {
            id: f.id,
            course_id: f.course_id,
            name: f.name,
            created_at: f.created_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseFileWithLessonsResponse {
    pub id: i32,
    pub course_id: i32,
    pub name: String,
    pub created_at: String,
    /// Highest `orderIndex` first
    pub lessons: Vec<LessonResponse>,
}

impl From<(CourseFileModel, Vec<CourseLessonModel>)> for CourseFileWithLessonsResponse {
    fn from((f, lessons): (CourseFileModel, Vec<CourseLessonModel>)) -> Self {
        Self {
            id: f.id,
            course_id: f.course_id,
            name: f.name,
            created_at: f.created_at.to_string(),
            lessons: lessons.into_iter().map(LessonResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeletedCourseFileResponse {
    pub file: CourseFileResponse,
    pub deleted_lessons_count: u64,
}

impl From<DeletedCourseFile> for DeletedCourseFileResponse {
    fn from(d: DeletedCourseFile) -> Self {
        Self {
            file: CourseFileResponse::from(d.file),
            deleted_lessons_count: d.deleted_lessons,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/courseFiles/course/{course_id}",
    params(("course_id" = i32, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Files of the course with their lessons", body = Vec<CourseFileWithLessonsResponse>),
    ),
    tag = "course-files"
)]
pub async fn list_course_files(
    Extension(store): Extension<Store>,
    Path(course_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = CourseFileService::new(store);
    let files = service.list_by_course(course_id).await?;

    let items: Vec<CourseFileWithLessonsResponse> = files
        .into_iter()
        .map(CourseFileWithLessonsResponse::from)
        .collect();
    Ok(ApiResponse::ok(items))
}

#[utoipa::path(
    post,
    path = "/api/v1/courseFiles",
    request_body = CreateCourseFileRequest,
    responses(
        (status = 201, description = "File created", body = CourseFileResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 404, description = "Course not found", body = AppError),
    ),
    tag = "course-files"
)]
pub async fn create_course_file(
    Extension(store): Extension<Store>,
    Json(payload): Json<CreateCourseFileRequest>,
) -> AppResult<impl IntoResponse> {
    validate(&payload)?;
    let course_id = required(payload.course_id, "courseId")?;
    let name = non_blank(&payload.name, "name")?;

    let service = CourseFileService::new(store);
    let file = service.create(course_id, &name).await?;

    Ok(ApiResponse::created(CourseFileResponse::from(file)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/courseFiles/{id}",
    params(("id" = i32, Path, description = "File ID")),
    responses(
        (status = 200, description = "File and its lessons deleted", body = DeletedCourseFileResponse),
        (status = 404, description = "File not found", body = AppError),
        (status = 409, description = "Concurrent update conflict", body = AppError),
    ),
    tag = "course-files"
)]
pub async fn delete_course_file(
    Extension(store): Extension<Store>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = CourseFileService::new(store);
    let deleted = service.delete(id).await?;

    Ok(ApiResponse::ok(DeletedCourseFileResponse::from(deleted)))
}
