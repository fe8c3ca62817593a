use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum CourseType {
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "free")]
    Free,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum CourseLevel {
    #[sea_orm(string_value = "Beginner")]
    Beginner,
    #[sea_orm(string_value = "Intermediate")]
    Intermediate,
    #[sea_orm(string_value = "Advanced")]
    Advanced,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "courses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub community_id: i32,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(column_name = "type")]
    pub course_type: Option<CourseType>,
    pub level: Option<CourseLevel>,
    pub cover_image: Option<String>,
    pub published: bool,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::community::Entity",
        from = "Column::CommunityId",
        to = "super::community::Column::Id"
    )]
    Community,
    #[sea_orm(has_many = "super::course_file::Entity")]
    CourseFile,
}

impl Related<super::community::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Community.def()
    }
}

impl Related<super::course_file::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CourseFile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_type_accepts_lowercase_only() {
        let t: CourseType = serde_json::from_str("\"paid\"").unwrap();
        assert_eq!(t, CourseType::Paid);
        assert!(serde_json::from_str::<CourseType>("\"Paid\"").is_err());
        assert!(serde_json::from_str::<CourseType>("\"premium\"").is_err());
    }

    #[test]
    fn course_level_is_capitalized() {
        let l: CourseLevel = serde_json::from_str("\"Intermediate\"").unwrap();
        assert_eq!(l, CourseLevel::Intermediate);
        assert!(serde_json::from_str::<CourseLevel>("\"expert\"").is_err());
    }

    #[test]
    fn db_values_match_wire_values() {
        assert_eq!(CourseType::Free.to_value(), "free");
        assert_eq!(CourseLevel::Advanced.to_value(), "Advanced");
    }
}
