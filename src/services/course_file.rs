use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::{
        course_file, course_lesson, Course, CourseFile, CourseFileModel, CourseLesson,
        CourseLessonModel,
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder, Set,
};

#[derive(Debug, Clone)]
pub struct DeletedCourseFile {
    pub file: CourseFileModel,
    pub deleted_lessons: u64,
}

pub struct CourseFileService {
    store: Store,
}

impl CourseFileService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Files of a course, newest first, each with its lessons by descending
    /// `order_index`.
    pub async fn list_by_course(
        &self,
        course_id: i32,
    ) -> AppResult<Vec<(CourseFileModel, Vec<CourseLessonModel>)>> {
        let mut files = CourseFile::find()
            .filter(course_file::Column::CourseId.eq(course_id))
            .order_by_desc(course_file::Column::CreatedAt)
            .order_by_desc(course_file::Column::Id)
            .find_with_related(CourseLesson)
            .all(self.store.conn())
            .await?;

        for (_, lessons) in files.iter_mut() {
            lessons.sort_by(|a, b| b.order_index.cmp(&a.order_index).then(b.id.cmp(&a.id)));
        }

        Ok(files)
    }

    pub async fn create(&self, course_id: i32, name: &str) -> AppResult<CourseFileModel> {
        Course::find_by_id(course_id)
            .one(self.store.conn())
            .await?
            .ok_or(AppError::NotFound)?;

        let file = course_file::ActiveModel {
            course_id: Set(course_id),
            name: Set(name.to_string()),
            created_at: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(self.store.conn())
        .await?;
        Ok(file)
    }

    /// Delete a file and all of its lessons atomically.
    ///
    /// The file is looked up first; an unknown id aborts before any lesson
    /// is touched.
    pub async fn delete(&self, id: i32) -> AppResult<DeletedCourseFile> {
        self.store
            .with_transaction("delete_course_file", move |txn| {
                Box::pin(delete_in_txn(txn, id))
            })
            .await
    }
}

async fn delete_in_txn(txn: &DatabaseTransaction, id: i32) -> AppResult<DeletedCourseFile> {
    let file = CourseFile::find_by_id(id)
        .one(txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let deleted_lessons = CourseLesson::delete_many()
        .filter(course_lesson::Column::FileId.eq(id))
        .exec(txn)
        .await?
        .rows_affected;

    let result = CourseFile::delete_by_id(id).exec(txn).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    Ok(DeletedCourseFile {
        file,
        deleted_lessons,
    })
}
