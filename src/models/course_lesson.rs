use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "course_lessons")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub file_id: i32,
    pub title: String,
    pub duration: Option<String>,
    pub points: Option<i32>,
    #[sea_orm(column_type = "Text", nullable)]
    pub content: Option<String>,
    pub video_url: Option<String>,
    /// Lesson count of the file at insertion time. Never renumbered.
    pub order_index: i32,
    pub published: bool,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::course_file::Entity",
        from = "Column::FileId",
        to = "super::course_file::Column::Id"
    )]
    CourseFile,
}

impl Related<super::course_file::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CourseFile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
