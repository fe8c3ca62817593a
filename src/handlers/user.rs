use crate::db::Store;
use crate::error::{AppError, AppResult};
use crate::handlers::{non_blank, validate};
use crate::models::UserModel;
use crate::response::ApiResponse;
use crate::services::user::{UserProfile, UserService};
use axum::{extract::Path, response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpsertUserRequest {
    /// Identity provider uid
    #[serde(default)]
    #[validate(length(min = 1, max = 128))]
    pub uid: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 100))]
    pub display_name: Option<String>,
    #[serde(rename = "photoURL", alias = "photoUrl")]
    #[validate(length(max = 2048))]
    pub photo_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    pub role: String,
    pub created_at: String,
}

impl From<UserModel> for UserResponse {
    fn from(u: UserModel) -> Self {
        Self {
            uid: u.uid,
            email: u.email,
            display_name: u.display_name,
            photo_url: u.photo_url,
            role: u.role,
            created_at: u.created_at.to_string(),
        }
    }
}

/// Author block embedded in post and comment listings.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorResponse {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    pub role: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = UpsertUserRequest,
    responses(
        (status = 200, description = "User created or updated", body = UserResponse),
        (status = 400, description = "Validation error", body = AppError),
    ),
    tag = "users"
)]
pub async fn upsert_user(
    Extension(store): Extension<Store>,
    Json(payload): Json<UpsertUserRequest>,
) -> AppResult<impl IntoResponse> {
    validate(&payload)?;
    let uid = non_blank(&payload.uid, "uid")?;

    let service = UserService::new(store);
    let user = service
        .upsert(UserProfile {
            uid,
            email: payload.email,
            display_name: payload.display_name,
            photo_url: payload.photo_url,
        })
        .await?;

    Ok(ApiResponse::ok(UserResponse::from(user)))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{uid}",
    params(("uid" = String, Path, description = "User uid")),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "users"
)]
pub async fn get_user(
    Extension(store): Extension<Store>,
    Path(uid): Path<String>,
) -> AppResult<impl IntoResponse> {
    let service = UserService::new(store);
    let user = service.get_by_uid(&uid).await?;
    Ok(ApiResponse::ok(UserResponse::from(user)))
}
