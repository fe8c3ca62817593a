use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::{course_lesson, CourseFile, CourseLesson, CourseLessonModel},
    services::counters,
};
use sea_orm::{ActiveModelTrait, DatabaseTransaction, EntityTrait, Set};

#[derive(Debug, Clone)]
pub struct LessonFields {
    pub title: String,
    pub duration: Option<String>,
    pub points: Option<i32>,
    pub content: Option<String>,
    pub video_url: Option<String>,
    pub published: Option<bool>,
}

pub struct LessonService {
    store: Store,
}

impl LessonService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Append a lesson to `file_id`. Its `order_index` is the file's lesson
    /// count at insertion time.
    pub async fn create(&self, file_id: i32, fields: LessonFields) -> AppResult<CourseLessonModel> {
        self.store
            .with_transaction("create_lesson", move |txn| {
                Box::pin(create_in_txn(txn, file_id, fields.clone()))
            })
            .await
    }

    /// Replace a lesson's editable fields. `order_index` only changes when
    /// given explicitly; the file never changes.
    pub async fn update(
        &self,
        id: i32,
        fields: LessonFields,
        order_index: Option<i32>,
    ) -> AppResult<CourseLessonModel> {
        let existing = CourseLesson::find_by_id(id)
            .one(self.store.conn())
            .await?
            .ok_or(AppError::NotFound)?;

        let published = fields.published.unwrap_or(existing.published);
        let mut active: course_lesson::ActiveModel = existing.into();
        active.title = Set(fields.title);
        active.duration = Set(fields.duration);
        active.points = Set(fields.points);
        active.content = Set(fields.content);
        active.video_url = Set(fields.video_url);
        active.published = Set(published);
        if let Some(order_index) = order_index {
            active.order_index = Set(order_index);
        }

        let updated = active.update(self.store.conn()).await?;
        Ok(updated)
    }

    /// Remaining lessons keep their indices.
    pub async fn delete(&self, id: i32) -> AppResult<CourseLessonModel> {
        let existing = CourseLesson::find_by_id(id)
            .one(self.store.conn())
            .await?
            .ok_or(AppError::NotFound)?;

        let result = CourseLesson::delete_by_id(id)
            .exec(self.store.conn())
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }

        Ok(existing)
    }
}

async fn create_in_txn(
    txn: &DatabaseTransaction,
    file_id: i32,
    fields: LessonFields,
) -> AppResult<CourseLessonModel> {
    CourseFile::find_by_id(file_id)
        .one(txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let order_index = counters::next_lesson_index(txn, file_id).await?;

    let lesson = course_lesson::ActiveModel {
        file_id: Set(file_id),
        title: Set(fields.title),
        duration: Set(fields.duration),
        points: Set(fields.points),
        content: Set(fields.content),
        video_url: Set(fields.video_url),
        order_index: Set(order_index),
        published: Set(fields.published.unwrap_or(false)),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    Ok(lesson)
}
