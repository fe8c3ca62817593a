pub mod category;
pub mod comment;
pub mod community;
pub mod counters;
pub mod course;
pub mod course_file;
pub mod lesson;
pub mod like;
pub mod post;
pub mod user;
