use crate::db::Store;
use crate::error::{AppError, AppResult};
use crate::handlers::course::CourseResponse;
use crate::handlers::post::PostSummaryResponse;
use crate::handlers::validate;
use crate::models::CommunityModel;
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::community::{CommunityService, MembershipAction, MembershipToggle};
use crate::services::course::CourseService;
use crate::services::post::PostService;
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommunityResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub community_type: Option<String>,
    pub language: Option<String>,
    /// Number of current members
    pub member_count: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<CommunityModel> for CommunityResponse {
    fn from(c: CommunityModel) -> Self {
        Self {
            id: c.id,
            name: c.name,
            description: c.description,
            community_type: c.community_type,
            language: c.language,
            member_count: c.member_count,
            created_at: c.created_at.to_string(),
            updated_at: c.updated_at.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MembershipRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 128))]
    pub user_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MembershipResponse {
    pub community_id: i32,
    /// `joined` or `left`
    pub action: MembershipAction,
    pub member_count: i32,
}

impl From<MembershipToggle> for MembershipResponse {
    fn from(t: MembershipToggle) -> Self {
        Self {
            community_id: t.community_id,
            action: t.action,
            member_count: t.member_count,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/communities",
    responses(
        (status = 200, description = "List of communities, newest first", body = Vec<CommunityResponse>),
    ),
    tag = "communities"
)]
pub async fn list_communities(Extension(store): Extension<Store>) -> AppResult<impl IntoResponse> {
    let service = CommunityService::new(store);
    let communities = service.list().await?;

    let items: Vec<CommunityResponse> = communities
        .into_iter()
        .map(CommunityResponse::from)
        .collect();
    Ok(ApiResponse::ok(items))
}

#[utoipa::path(
    get,
    path = "/api/v1/communities/{id}",
    params(("id" = i32, Path, description = "Community ID")),
    responses(
        (status = 200, description = "Community details", body = CommunityResponse),
        (status = 404, description = "Community not found", body = AppError),
    ),
    tag = "communities"
)]
pub async fn get_community(
    Extension(store): Extension<Store>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = CommunityService::new(store);
    let community = service.get_by_id(id).await?;
    Ok(ApiResponse::ok(CommunityResponse::from(community)))
}

#[utoipa::path(
    post,
    path = "/api/v1/communities/{id}/membership",
    params(("id" = i32, Path, description = "Community ID")),
    request_body = MembershipRequest,
    responses(
        (status = 200, description = "Membership toggled", body = MembershipResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 404, description = "Community not found", body = AppError),
        (status = 409, description = "Concurrent update conflict", body = AppError),
    ),
    tag = "communities"
)]
pub async fn toggle_membership(
    Extension(store): Extension<Store>,
    Path(id): Path<i32>,
    Json(payload): Json<MembershipRequest>,
) -> AppResult<impl IntoResponse> {
    validate(&payload)?;

    let service = CommunityService::new(store);
    let toggle = service.toggle_membership(id, &payload.user_id).await?;

    Ok(ApiResponse::ok(MembershipResponse::from(toggle)))
}

#[utoipa::path(
    get,
    path = "/api/v1/communities/{id}/posts",
    params(
        ("id" = i32, Path, description = "Community ID"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Posts, pinned first then newest", body = PaginatedResponse<PostSummaryResponse>),
        (status = 404, description = "Community not found", body = AppError),
    ),
    tag = "posts"
)]
pub async fn list_community_posts(
    Extension(store): Extension<Store>,
    Path(id): Path<i32>,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let (page, per_page) = params.resolve();

    CommunityService::new(store.clone()).get_by_id(id).await?;

    let service = PostService::new(store);
    let (posts, total) = service.list_by_community(id, page, per_page).await?;

    let items: Vec<PostSummaryResponse> =
        posts.into_iter().map(PostSummaryResponse::from).collect();
    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/communities/{id}/courses",
    params(("id" = i32, Path, description = "Community ID")),
    responses(
        (status = 200, description = "Courses, newest first", body = Vec<CourseResponse>),
        (status = 404, description = "Community not found", body = AppError),
    ),
    tag = "courses"
)]
pub async fn list_community_courses(
    Extension(store): Extension<Store>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = CourseService::new(store);
    let courses = service.list_by_community(id).await?;

    let items: Vec<CourseResponse> = courses.into_iter().map(CourseResponse::from).collect();
    Ok(ApiResponse::ok(items))
}
