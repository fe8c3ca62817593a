use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::{
        course, course_file, course_lesson, Community, Course, CourseFile, CourseLesson,
        CourseLevel, CourseModel, CourseType,
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

#[derive(Debug, Clone)]
pub struct NewCourse {
    pub community_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub course_type: Option<CourseType>,
    pub level: Option<CourseLevel>,
    pub cover_image: Option<String>,
    pub published: bool,
}

#[derive(Debug, Clone)]
pub struct DeletedCourse {
    pub course: CourseModel,
    pub deleted_files: u64,
    pub deleted_lessons: u64,
}

pub struct CourseService {
    store: Store,
}

impl CourseService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn list_by_community(&self, community_id: i32) -> AppResult<Vec<CourseModel>> {
        Community::find_by_id(community_id)
            .one(self.store.conn())
            .await?
            .ok_or(AppError::NotFound)?;

        let courses = Course::find()
            .filter(course::Column::CommunityId.eq(community_id))
            .order_by_desc(course::Column::CreatedAt)
            .all(self.store.conn())
            .await?;
        Ok(courses)
    }

    pub async fn create(&self, input: NewCourse) -> AppResult<CourseModel> {
        let course = course::ActiveModel {
            community_id: Set(input.community_id),
            name: Set(input.name),
            description: Set(input.description),
            course_type: Set(input.course_type),
            level: Set(input.level),
            cover_image: Set(input.cover_image),
            published: Set(input.published),
            created_at: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(self.store.conn())
        .await?;
        Ok(course)
    }

    /// Delete a course together with its files and their lessons.
    pub async fn delete(&self, id: i32) -> AppResult<DeletedCourse> {
        self.store
            .with_transaction("delete_course", move |txn| {
                Box::pin(delete_in_txn(txn, id))
            })
            .await
    }
}

async fn delete_in_txn(txn: &DatabaseTransaction, id: i32) -> AppResult<DeletedCourse> {
    let course = Course::find_by_id(id)
        .one(txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let file_ids: Vec<i32> = CourseFile::find()
        .select_only()
        .column(course_file::Column::Id)
        .filter(course_file::Column::CourseId.eq(id))
        .into_tuple()
        .all(txn)
        .await?;

    let deleted_lessons = if file_ids.is_empty() {
        0
    } else {
        CourseLesson::delete_many()
            .filter(course_lesson::Column::FileId.is_in(file_ids))
            .exec(txn)
            .await?
            .rows_affected
    };

    let deleted_files = CourseFile::delete_many()
        .filter(course_file::Column::CourseId.eq(id))
        .exec(txn)
        .await?
        .rows_affected;

    Course::delete_by_id(id).exec(txn).await?;

    tracing::info!(
        course_id = id,
        deleted_files,
        deleted_lessons,
        "Course deleted"
    );

    Ok(DeletedCourse {
        course,
        deleted_files,
        deleted_lessons,
    })
}
