pub mod category;
pub mod comment;
pub mod community;
pub mod course;
pub mod course_file;
pub mod lesson;
pub mod like;
pub mod post;
pub mod user;

use crate::error::{AppError, AppResult};
use validator::Validate;

/// Run `validator` rules on a request body, mapping failures to a 400.
pub(crate) fn validate<T: Validate>(payload: &T) -> AppResult<()> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))
}

/// Reject a missing id field with a readable message.
pub(crate) fn required<T>(value: Option<T>, field: &str) -> AppResult<T> {
    value.ok_or_else(|| AppError::Validation(format!("{} is required", field)))
}

/// Trimmed text, or a validation error when nothing is left.
pub(crate) fn non_blank(value: &str, field: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}
