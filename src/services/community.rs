use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::{community, community_member, Community, CommunityMember, CommunityModel},
    services::counters,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MembershipAction {
    Joined,
    Left,
}

#[derive(Debug, Clone, Copy)]
pub struct MembershipToggle {
    pub community_id: i32,
    pub action: MembershipAction,
    pub member_count: i32,
}

pub struct CommunityService {
    store: Store,
}

impl CommunityService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> AppResult<Vec<CommunityModel>> {
        let communities = Community::find()
            .order_by_desc(community::Column::CreatedAt)
            .all(self.store.conn())
            .await?;
        Ok(communities)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<CommunityModel> {
        Community::find_by_id(id)
            .one(self.store.conn())
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Join if not a member, leave otherwise; keeps `member_count` in step.
    pub async fn toggle_membership(
        &self,
        community_id: i32,
        user_id: &str,
    ) -> AppResult<MembershipToggle> {
        let user_id = user_id.trim().to_string();
        if user_id.is_empty() {
            return Err(AppError::Validation("User ID is required".to_string()));
        }

        self.store
            .with_transaction("toggle_membership", move |txn| {
                Box::pin(toggle_in_txn(txn, community_id, user_id.clone()))
            })
            .await
    }
}

async fn toggle_in_txn(
    txn: &DatabaseTransaction,
    community_id: i32,
    user_id: String,
) -> AppResult<MembershipToggle> {
    let existing = CommunityMember::find()
        .filter(community_member::Column::CommunityId.eq(community_id))
        .filter(community_member::Column::UserId.eq(user_id.as_str()))
        .one(txn)
        .await?;

    let (action, delta) = match existing {
        Some(_) => (MembershipAction::Left, -1),
        None => (MembershipAction::Joined, 1),
    };

    let member_count = counters::adjust_member_count(txn, community_id, delta).await?;

    match action {
        MembershipAction::Left => {
            CommunityMember::delete_many()
                .filter(community_member::Column::CommunityId.eq(community_id))
                .filter(community_member::Column::UserId.eq(user_id.as_str()))
                .exec(txn)
                .await?;
        }
        MembershipAction::Joined => {
            community_member::ActiveModel {
                community_id: Set(community_id),
                user_id: Set(user_id),
                created_at: Set(chrono::Utc::now().naive_utc()),
                ..Default::default()
            }
            .insert(txn)
            .await?;
        }
    }

    Ok(MembershipToggle {
        community_id,
        action,
        member_count,
    })
}
