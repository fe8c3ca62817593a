pub mod category;
pub mod comment;
pub mod community;
pub mod community_member;
pub mod course;
pub mod course_file;
pub mod course_lesson;
pub mod like;
pub mod post;
pub mod user;

pub use category::{Entity as Category, Model as CategoryModel};
pub use comment::{Entity as Comment, Model as CommentModel};
pub use community::{Entity as Community, Model as CommunityModel};
pub use community_member::Entity as CommunityMember;
pub use course::{CourseLevel, CourseType, Entity as Course, Model as CourseModel};
pub use course_file::{Entity as CourseFile, Model as CourseFileModel};
pub use course_lesson::{Entity as CourseLesson, Model as CourseLessonModel};
pub use like::{Entity as Like, Model as LikeModel};
pub use post::{Entity as Post, Model as PostModel};
pub use user::{Entity as User, Model as UserModel};
