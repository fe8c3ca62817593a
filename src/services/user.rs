use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::{user, User, UserModel},
};
use sea_orm::{ConnectionTrait, EntityTrait, FromQueryResult, Statement};

#[derive(Debug, Clone)]
pub struct UserProfile {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

// `role` is left alone on conflict so a profile sync cannot demote or promote.
const UPSERT_SQL: &str = "INSERT INTO users (uid, email, display_name, photo_url, role, created_at) \
    VALUES ($1, $2, $3, $4, $5, NOW()) \
    ON CONFLICT (uid) DO UPDATE \
    SET email = EXCLUDED.email, \
        display_name = EXCLUDED.display_name, \
        photo_url = EXCLUDED.photo_url \
    RETURNING uid, email, display_name, photo_url, role, created_at";

pub struct UserService {
    store: Store,
}

impl UserService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn upsert(&self, profile: UserProfile) -> AppResult<UserModel> {
        let stmt = Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            UPSERT_SQL,
            vec![
                profile.uid.into(),
                profile.email.into(),
                profile.display_name.into(),
                profile.photo_url.into(),
                user::DEFAULT_ROLE.into(),
            ],
        );

        let row = self
            .store
            .conn()
            .query_one(stmt)
            .await?
            .ok_or(AppError::Internal(anyhow::anyhow!("Upsert returned no row")))?;

        Ok(UserModel::from_query_result(&row, "")?)
    }

    pub async fn get_by_uid(&self, uid: &str) -> AppResult<UserModel> {
        User::find_by_id(uid.to_string())
            .one(self.store.conn())
            .await?
            .ok_or(AppError::NotFound)
    }
}
